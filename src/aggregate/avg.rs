//! Running average

use crate::aggregate::{
    checked, resolve_numeric_input, restore_checked, Accumulator, AggregateKind,
    AttributeAggregator,
};
use crate::checkpoint::{AvgSnapshot, Snapshot, SnapshotLayout, StateSnapshot};
use crate::common::error::PrismStreamResult;
use crate::expression::ExpressionRef;
use crate::malformed_state_err;
use crate::types::{LogicalType, NumericType, Value, Working};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AvgAccumulator {
    sum: f64,
    count: i64,
}

impl Accumulator<f64> for AvgAccumulator {
    fn add(&mut self, value: f64) -> Value {
        self.sum += value;
        self.count += 1;
        self.result()
    }

    fn remove(&mut self, value: f64) -> Value {
        self.count -= 1;
        if self.count == 0 {
            self.sum = 0.0;
        } else {
            self.sum -= value;
        }
        self.result()
    }

    /// Null while empty
    fn result(&self) -> Value {
        if self.count == 0 {
            Value::Null
        } else {
            Value::Double(self.sum / self.count as f64)
        }
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::Avg(AvgSnapshot {
            sum: self.sum,
            count: self.count,
        })
    }

    fn restore(&mut self, state: &StateSnapshot) -> PrismStreamResult<()> {
        let StateSnapshot::Avg(snapshot) = state else {
            return Err(state.mismatch(SnapshotLayout::Avg));
        };
        if snapshot.count < 0 {
            return Err(malformed_state_err!(
                "avg snapshot has negative count {}",
                snapshot.count
            ));
        }
        self.sum = snapshot.sum;
        self.count = snapshot.count;
        Ok(())
    }
}

/// `avg(x)` over int, long, float or double input
#[derive(Debug)]
pub struct AvgAggregator {
    input_type: NumericType,
    return_type: LogicalType,
    accumulator: AvgAccumulator,
}

impl AvgAggregator {
    pub fn init(inputs: &[ExpressionRef]) -> PrismStreamResult<Self> {
        let input_type = resolve_numeric_input(AggregateKind::Avg, inputs)?;
        debug!(aggregate = "avg", input = %input_type, "resolved aggregator backing");
        Ok(Self {
            input_type,
            return_type: f64::RESULT_TYPE,
            accumulator: AvgAccumulator::default(),
        })
    }
}

impl AttributeAggregator for AvgAggregator {
    fn kind(&self) -> AggregateKind {
        AggregateKind::Avg
    }

    fn return_type(&self) -> &LogicalType {
        &self.return_type
    }

    fn process_add(&mut self, value: &Value) -> PrismStreamResult<Value> {
        let value = f64::widen(checked(AggregateKind::Avg, self.input_type, value)?)?;
        Ok(self.accumulator.add(value))
    }

    fn process_remove(&mut self, value: &Value) -> PrismStreamResult<Value> {
        let value = f64::widen(checked(AggregateKind::Avg, self.input_type, value)?)?;
        Ok(self.accumulator.remove(value))
    }

    fn reset(&mut self) -> Value {
        self.accumulator.reset()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.accumulator.snapshot())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> PrismStreamResult<()> {
        let accumulator = &mut self.accumulator;
        restore_checked(AggregateKind::Avg, snapshot, |state| accumulator.restore(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_with_retraction() {
        let mut acc = AvgAccumulator::default();
        assert_eq!(acc.result(), Value::Null);
        acc.add(2.0);
        acc.add(4.0);
        assert_eq!(acc.add(9.0), Value::double(5.0));
        assert_eq!(acc.remove(2.0), Value::double(6.5));
    }

    #[test]
    fn test_empty_average_is_null() {
        let mut acc = AvgAccumulator::default();
        acc.add(0.1);
        assert_eq!(acc.remove(0.1), Value::Null);
        assert_eq!(acc, AvgAccumulator::default());
        assert_eq!(acc.reset(), Value::Null);
    }
}
