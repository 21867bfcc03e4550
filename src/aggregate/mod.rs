//! Incremental attribute aggregators
//!
//! An aggregator is created once per aggregate expression with its input
//! expressions, resolves the declared input type at that point, and is then
//! fed one value per event: [`AttributeAggregator::process_add`] when an event
//! enters the aggregation scope and [`AttributeAggregator::process_remove`]
//! when a window evicts it. Each call returns the updated aggregate result.
//!
//! | Function | Input types | Result type |
//! |----------|-------------|-------------|
//! | `sum` | int, long / float, double | BIGINT / DOUBLE |
//! | `stdDev` | int, long, float, double | DOUBLE (population) |
//! | `avg` | int, long, float, double | DOUBLE |
//! | `count` | any | BIGINT |
//! | `min`, `max` | int, long / float, double | BIGINT / DOUBLE |

pub mod accumulator;
pub mod avg;
pub mod count;
pub mod extremum;
pub mod stddev;
pub mod sum;

pub use accumulator::{Accumulator, Backing};
pub use avg::{AvgAccumulator, AvgAggregator};
pub use count::{CountAccumulator, CountAggregator};
pub use extremum::{ExtremumAccumulator, ExtremumAggregator, MaxAggregator, MinAggregator};
pub use stddev::{StddevAccumulator, StddevAggregator};
pub use sum::{SumAccumulator, SumAggregator};

use crate::checkpoint::{Snapshot, StateSnapshot};
use crate::common::error::{PrismStreamError, PrismStreamResult};
use crate::expression::ExpressionRef;
use crate::types::{LogicalType, NumericType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Aggregate function implemented by an aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    Sum,
    Stddev,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregateKind {
    /// Function name as written in queries
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "sum",
            AggregateKind::Stddev => "stdDev",
            AggregateKind::Avg => "avg",
            AggregateKind::Count => "count",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AggregateKind {
    type Err = PrismStreamError;

    fn from_str(s: &str) -> PrismStreamResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(AggregateKind::Sum),
            "stddev" => Ok(AggregateKind::Stddev),
            "avg" => Ok(AggregateKind::Avg),
            "count" => Ok(AggregateKind::Count),
            "min" => Ok(AggregateKind::Min),
            "max" => Ok(AggregateKind::Max),
            _ => Err(PrismStreamError::InvalidArgument(format!(
                "Unknown aggregate function: {}",
                s
            ))),
        }
    }
}

/// Lifecycle contract shared by every aggregate function
///
/// Mutating calls take `&mut self`: the owner of an aggregator serializes
/// add, remove and reset calls, and snapshots are taken while none is in
/// flight.
pub trait AttributeAggregator: fmt::Debug + Send {
    fn kind(&self) -> AggregateKind;

    /// Result type resolved at init
    fn return_type(&self) -> &LogicalType;

    /// Add one value's contribution and return the updated result
    fn process_add(&mut self, value: &Value) -> PrismStreamResult<Value>;

    /// Batch form of add; unary aggregates always reject it
    fn process_add_batch(&mut self, values: &[Value]) -> PrismStreamResult<Value> {
        Err(reject_batch(self.kind(), "add", values))
    }

    /// Retract one value's contribution and return the updated result
    fn process_remove(&mut self, value: &Value) -> PrismStreamResult<Value>;

    /// Batch form of remove; unary aggregates always reject it
    fn process_remove_batch(&mut self, values: &[Value]) -> PrismStreamResult<Value> {
        Err(reject_batch(self.kind(), "remove", values))
    }

    /// Return to the zero state and return the zero-valued result
    fn reset(&mut self) -> Value;

    fn start(&mut self) {}

    fn stop(&mut self) {}

    /// Capture the current state without mutating it
    fn snapshot(&self) -> Snapshot;

    /// Overwrite the current state; on error the state is left untouched
    fn restore(&mut self, snapshot: &Snapshot) -> PrismStreamResult<()>;
}

/// Boxed aggregator as stored by its owner
pub type AggregatorRef = Box<dyn AttributeAggregator>;

/// Create the aggregator for an aggregate function over its input expressions
pub fn create_aggregator(
    kind: AggregateKind,
    inputs: &[ExpressionRef],
) -> PrismStreamResult<AggregatorRef> {
    Ok(match kind {
        AggregateKind::Sum => Box::new(SumAggregator::init(inputs)?),
        AggregateKind::Stddev => Box::new(StddevAggregator::init(inputs)?),
        AggregateKind::Avg => Box::new(AvgAggregator::init(inputs)?),
        AggregateKind::Count => Box::new(CountAggregator::init(inputs)?),
        AggregateKind::Min => Box::new(MinAggregator::init(inputs)?),
        AggregateKind::Max => Box::new(MaxAggregator::init(inputs)?),
    })
}

/// Require exactly one input expression
pub(crate) fn single_input(
    kind: AggregateKind,
    inputs: &[ExpressionRef],
) -> PrismStreamResult<&ExpressionRef> {
    match inputs {
        [input] => Ok(input),
        _ => Err(PrismStreamError::Configuration(format!(
            "{} aggregator has to have exactly 1 parameter, currently {} parameters provided",
            kind,
            inputs.len()
        ))),
    }
}

/// Require exactly one input expression of a numeric declared type
pub(crate) fn resolve_numeric_input(
    kind: AggregateKind,
    inputs: &[ExpressionRef],
) -> PrismStreamResult<NumericType> {
    let input = single_input(kind, inputs)?;
    NumericType::resolve(input.return_type()).map_err(|_| {
        PrismStreamError::UnsupportedType(format!(
            "{} not supported for {}",
            kind,
            input.return_type()
        ))
    })
}

fn reject_batch(kind: AggregateKind, operation: &str, values: &[Value]) -> PrismStreamError {
    warn!(aggregate = %kind, operation, arity = values.len(), "rejected batch call");
    PrismStreamError::UnsupportedOperation(format!(
        "{} cannot process data array, but found {:?}",
        kind, values
    ))
}

/// Check a per-event value against the resolved input type
pub(crate) fn checked<'a>(
    kind: AggregateKind,
    input_type: NumericType,
    value: &'a Value,
) -> PrismStreamResult<&'a Value> {
    input_type.check(value).map_err(|err| {
        warn!(aggregate = %kind, %input_type, found = %value.get_type(), "rejected mistyped value");
        err
    })?;
    Ok(value)
}

/// Version-check a snapshot, then hand its state to the accumulator
pub(crate) fn restore_checked<F>(
    kind: AggregateKind,
    snapshot: &Snapshot,
    restore: F,
) -> PrismStreamResult<()>
where
    F: FnOnce(&StateSnapshot) -> PrismStreamResult<()>,
{
    snapshot
        .check_version()
        .and_then(|_| restore(&snapshot.state))
        .map_err(|err| {
            warn!(aggregate = %kind, layout = %snapshot.layout(), error = %err, "rejected snapshot");
            err
        })?;
    debug!(aggregate = %kind, layout = %snapshot.layout(), "restored aggregator state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ColumnRefExpression, ConstantExpression};

    fn column(return_type: LogicalType) -> ExpressionRef {
        ColumnRefExpression::new(0, "value", return_type).into_ref()
    }

    #[test]
    fn test_parse_kind() -> PrismStreamResult<()> {
        assert_eq!("sum".parse::<AggregateKind>()?, AggregateKind::Sum);
        assert_eq!("stdDev".parse::<AggregateKind>()?, AggregateKind::Stddev);
        assert_eq!("AVG".parse::<AggregateKind>()?, AggregateKind::Avg);
        assert!("median".parse::<AggregateKind>().is_err());
        Ok(())
    }

    #[test]
    fn test_create_aggregator_resolves_return_type() -> PrismStreamResult<()> {
        let cases = [
            (AggregateKind::Sum, LogicalType::Integer, LogicalType::BigInt),
            (AggregateKind::Sum, LogicalType::Float, LogicalType::Double),
            (AggregateKind::Stddev, LogicalType::BigInt, LogicalType::Double),
            (AggregateKind::Avg, LogicalType::Integer, LogicalType::Double),
            (AggregateKind::Count, LogicalType::Varchar, LogicalType::BigInt),
            (AggregateKind::Min, LogicalType::Integer, LogicalType::BigInt),
            (AggregateKind::Max, LogicalType::Float, LogicalType::Double),
        ];
        for (kind, input, expected) in cases {
            let aggregator = create_aggregator(kind, &[column(input)])?;
            assert_eq!(aggregator.kind(), kind);
            assert_eq!(aggregator.return_type(), &expected);
        }
        Ok(())
    }

    #[test]
    fn test_arity_is_checked_for_every_kind() {
        let kinds = [
            AggregateKind::Sum,
            AggregateKind::Stddev,
            AggregateKind::Avg,
            AggregateKind::Count,
            AggregateKind::Min,
            AggregateKind::Max,
        ];
        for kind in kinds {
            let err = create_aggregator(kind, &[]).unwrap_err();
            assert!(matches!(err, PrismStreamError::Configuration(_)), "{}", kind);

            let two = [column(LogicalType::Double), column(LogicalType::Double)];
            let err = create_aggregator(kind, &two).unwrap_err();
            assert!(matches!(err, PrismStreamError::Configuration(_)), "{}", kind);
        }
    }

    #[test]
    fn test_batch_calls_are_rejected() -> PrismStreamResult<()> {
        let input = ConstantExpression::new(Value::double(1.0)).into_ref();
        let mut aggregator = create_aggregator(AggregateKind::Stddev, &[input])?;
        let values = [Value::double(1.0), Value::double(2.0)];

        let err = aggregator.process_add_batch(&values).unwrap_err();
        assert!(matches!(err, PrismStreamError::UnsupportedOperation(_)));
        let err = aggregator.process_remove_batch(&values).unwrap_err();
        assert!(matches!(err, PrismStreamError::UnsupportedOperation(_)));
        Ok(())
    }
}
