//! Incremental sum

use crate::aggregate::{
    checked, resolve_numeric_input, restore_checked, Accumulator, AggregateKind,
    AttributeAggregator, Backing,
};
use crate::checkpoint::{Snapshot, StateSnapshot, SumSnapshot};
use crate::common::error::PrismStreamResult;
use crate::expression::ExpressionRef;
use crate::types::{LogicalType, NumericType, Value, Working};
use tracing::debug;

/// Running sum in working type `T`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SumAccumulator<T> {
    sum: T,
}

impl<T: Working> Default for SumAccumulator<T> {
    fn default() -> Self {
        Self { sum: T::zero() }
    }
}

impl<T: Working> SumAccumulator<T> {
    pub fn sum(&self) -> T {
        self.sum
    }
}

impl<T: Working> Accumulator<T> for SumAccumulator<T> {
    fn add(&mut self, value: T) -> Value {
        self.sum = self.sum.accumulate(value);
        self.result()
    }

    // No lower bound; retracting a value that was never added is not checked
    fn remove(&mut self, value: T) -> Value {
        self.sum = self.sum.retract(value);
        self.result()
    }

    fn result(&self) -> Value {
        self.sum.into_value()
    }

    fn snapshot(&self) -> StateSnapshot {
        T::sum_state(SumSnapshot { sum: self.sum })
    }

    fn restore(&mut self, state: &StateSnapshot) -> PrismStreamResult<()> {
        let snapshot = T::sum_from_state(state).ok_or_else(|| state.mismatch(T::sum_layout()))?;
        self.sum = snapshot.sum;
        Ok(())
    }
}

type SumBacking = Backing<SumAccumulator<i64>, SumAccumulator<f64>>;

/// `sum(x)` over int, long, float or double input
#[derive(Debug)]
pub struct SumAggregator {
    input_type: NumericType,
    return_type: LogicalType,
    backing: SumBacking,
}

impl SumAggregator {
    pub fn init(inputs: &[ExpressionRef]) -> PrismStreamResult<Self> {
        let input_type = resolve_numeric_input(AggregateKind::Sum, inputs)?;
        let backing = SumBacking::for_input(input_type);
        let return_type = backing.return_type();
        debug!(aggregate = "sum", input = %input_type, result = %return_type, "resolved aggregator backing");
        Ok(Self {
            input_type,
            return_type,
            backing,
        })
    }
}

impl AttributeAggregator for SumAggregator {
    fn kind(&self) -> AggregateKind {
        AggregateKind::Sum
    }

    fn return_type(&self) -> &LogicalType {
        &self.return_type
    }

    fn process_add(&mut self, value: &Value) -> PrismStreamResult<Value> {
        self.backing.add(checked(AggregateKind::Sum, self.input_type, value)?)
    }

    fn process_remove(&mut self, value: &Value) -> PrismStreamResult<Value> {
        self.backing.remove(checked(AggregateKind::Sum, self.input_type, value)?)
    }

    fn reset(&mut self) -> Value {
        self.backing.reset()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.backing.snapshot())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> PrismStreamResult<()> {
        let backing = &mut self.backing;
        restore_checked(AggregateKind::Sum, snapshot, |state| backing.restore(state))
    }
}
