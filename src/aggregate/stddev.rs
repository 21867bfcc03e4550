//! Population standard deviation, maintained with a Welford-style update
//!
//! The mean and the running sum of squared deviations are updated per value,
//! in both directions, so a sliding window never recomputes from scratch.

use crate::aggregate::{
    checked, resolve_numeric_input, restore_checked, Accumulator, AggregateKind,
    AttributeAggregator,
};
use crate::checkpoint::{Snapshot, SnapshotLayout, StateSnapshot, StddevSnapshot};
use crate::common::error::PrismStreamResult;
use crate::expression::ExpressionRef;
use crate::malformed_state_err;
use crate::types::{LogicalType, NumericType, Value, Working};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StddevAccumulator {
    sum: f64,
    mean: f64,
    previous_mean: f64,
    sum_of_squared_deviation: f64,
    count: i64,
}

impl StddevAccumulator {
    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    fn zero(&mut self) {
        *self = Self::default();
    }
}

impl Accumulator<f64> for StddevAccumulator {
    fn add(&mut self, value: f64) -> Value {
        self.count += 1;
        if self.count == 1 {
            self.sum = value;
            self.mean = value;
            self.previous_mean = value;
            self.sum_of_squared_deviation = 0.0;
        } else {
            self.previous_mean = self.mean;
            self.sum += value;
            self.mean = self.sum / self.count as f64;
            self.sum_of_squared_deviation += (value - self.previous_mean) * (value - self.mean);
        }
        self.result()
    }

    fn remove(&mut self, value: f64) -> Value {
        self.count -= 1;
        if self.count == 0 {
            // previous_mean included, so the next add starts from a clean state
            self.zero();
        } else {
            self.previous_mean = self.mean;
            self.sum -= value;
            self.mean = self.sum / self.count as f64;
            self.sum_of_squared_deviation -= (value - self.previous_mean) * (value - self.mean);
        }
        self.result()
    }

    fn result(&self) -> Value {
        if self.count < 2 {
            return Value::Double(0.0);
        }
        // Rounding can leave a tiny negative residue after retractions
        let variance = (self.sum_of_squared_deviation / self.count as f64).max(0.0);
        Value::Double(variance.sqrt())
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::Stddev(StddevSnapshot {
            sum: self.sum,
            mean: self.mean,
            previous_mean: self.previous_mean,
            sum_of_squared_deviation: self.sum_of_squared_deviation,
            count: self.count,
        })
    }

    fn restore(&mut self, state: &StateSnapshot) -> PrismStreamResult<()> {
        let StateSnapshot::Stddev(snapshot) = state else {
            return Err(state.mismatch(SnapshotLayout::Stddev));
        };
        if snapshot.count < 0 {
            return Err(malformed_state_err!(
                "stddev snapshot has negative count {}",
                snapshot.count
            ));
        }
        *self = Self {
            sum: snapshot.sum,
            mean: snapshot.mean,
            previous_mean: snapshot.previous_mean,
            sum_of_squared_deviation: snapshot.sum_of_squared_deviation,
            count: snapshot.count,
        };
        Ok(())
    }
}

/// `stdDev(x)`: every numeric input type is widened to double
#[derive(Debug)]
pub struct StddevAggregator {
    input_type: NumericType,
    return_type: LogicalType,
    accumulator: StddevAccumulator,
}

impl StddevAggregator {
    pub fn init(inputs: &[ExpressionRef]) -> PrismStreamResult<Self> {
        let input_type = resolve_numeric_input(AggregateKind::Stddev, inputs)?;
        debug!(aggregate = "stdDev", input = %input_type, "resolved aggregator backing");
        Ok(Self {
            input_type,
            return_type: f64::RESULT_TYPE,
            accumulator: StddevAccumulator::default(),
        })
    }

    fn widen(&self, value: &Value) -> PrismStreamResult<f64> {
        f64::widen(checked(AggregateKind::Stddev, self.input_type, value)?)
    }
}

impl AttributeAggregator for StddevAggregator {
    fn kind(&self) -> AggregateKind {
        AggregateKind::Stddev
    }

    fn return_type(&self) -> &LogicalType {
        &self.return_type
    }

    fn process_add(&mut self, value: &Value) -> PrismStreamResult<Value> {
        let value = self.widen(value)?;
        Ok(self.accumulator.add(value))
    }

    fn process_remove(&mut self, value: &Value) -> PrismStreamResult<Value> {
        let value = self.widen(value)?;
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
        restore_checked(AggregateKind::Stddev, snapshot, |state| accumulator.restore(state))
    }
}
