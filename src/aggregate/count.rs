//! Event count
//!
//! Count never reads the value it is handed, so any declared input type
//! except NULL is accepted.

use crate::aggregate::{restore_checked, single_input, AggregateKind, AttributeAggregator};
use crate::checkpoint::{CountSnapshot, Snapshot, SnapshotLayout, StateSnapshot};
use crate::common::error::PrismStreamResult;
use crate::expression::ExpressionRef;
use crate::types::{LogicalType, Value};
use crate::{malformed_state_err, unsupported_type_err};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountAccumulator {
    count: i64,
}

impl CountAccumulator {
    pub fn add(&mut self) -> Value {
        self.count += 1;
        self.result()
    }

    pub fn remove(&mut self) -> Value {
        self.count -= 1;
        self.result()
    }

    pub fn result(&self) -> Value {
        Value::BigInt(self.count)
    }

    pub fn reset(&mut self) -> Value {
        self.count = 0;
        self.result()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::Count(CountSnapshot { count: self.count })
    }

    pub fn restore(&mut self, state: &StateSnapshot) -> PrismStreamResult<()> {
        let StateSnapshot::Count(snapshot) = state else {
            return Err(state.mismatch(SnapshotLayout::Count));
        };
        if snapshot.count < 0 {
            return Err(malformed_state_err!(
                "count snapshot has negative count {}",
                snapshot.count
            ));
        }
        self.count = snapshot.count;
        Ok(())
    }
}

/// `count(x)`
#[derive(Debug)]
pub struct CountAggregator {
    return_type: LogicalType,
    accumulator: CountAccumulator,
}

impl CountAggregator {
    pub fn init(inputs: &[ExpressionRef]) -> PrismStreamResult<Self> {
        let input = single_input(AggregateKind::Count, inputs)?;
        if input.return_type() == &LogicalType::Null {
            return Err(unsupported_type_err!("count not supported for {}", LogicalType::Null));
        }
        debug!(aggregate = "count", input = %input.return_type(), "resolved aggregator backing");
        Ok(Self {
            return_type: LogicalType::BigInt,
            accumulator: CountAccumulator::default(),
        })
    }
}

impl AttributeAggregator for CountAggregator {
    fn kind(&self) -> AggregateKind {
        AggregateKind::Count
    }

    fn return_type(&self) -> &LogicalType {
        &self.return_type
    }

    fn process_add(&mut self, _value: &Value) -> PrismStreamResult<Value> {
        Ok(self.accumulator.add())
    }

    fn process_remove(&mut self, _value: &Value) -> PrismStreamResult<Value> {
        Ok(self.accumulator.remove())
    }

    fn reset(&mut self) -> Value {
        self.accumulator.reset()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.accumulator.snapshot())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> PrismStreamResult<()> {
        let accumulator = &mut self.accumulator;
        restore_checked(AggregateKind::Count, snapshot, |state| accumulator.restore(state))
    }
}
