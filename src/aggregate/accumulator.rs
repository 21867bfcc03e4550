//! Accumulator state machines and the backing dispatch over working types

use crate::checkpoint::StateSnapshot;
use crate::common::error::PrismStreamResult;
use crate::types::{LogicalType, NumericType, Value, Working};
use std::fmt::Debug;

/// Running state of one aggregate, in working type `T`
///
/// Values arrive already type-checked and widened. `add` and `remove` return
/// the updated result so the caller never has to ask twice.
pub trait Accumulator<T: Working>: Default + Debug + Send {
    fn add(&mut self, value: T) -> Value;

    fn remove(&mut self, value: T) -> Value;

    /// Current result without mutating state
    fn result(&self) -> Value;

    fn reset(&mut self) -> Value {
        *self = Self::default();
        self.result()
    }

    fn snapshot(&self) -> StateSnapshot;

    /// Replace state from a snapshot; on error the state is left untouched
    fn restore(&mut self, state: &StateSnapshot) -> PrismStreamResult<()>;
}

/// Accumulator backing selected once from the declared input type
///
/// Integral inputs run in `i64`, floating inputs in `f64`.
#[derive(Debug)]
pub enum Backing<L, D> {
    Long(L),
    Double(D),
}

impl<L, D> Backing<L, D>
where
    L: Accumulator<i64>,
    D: Accumulator<f64>,
{
    pub fn for_input(input_type: NumericType) -> Self {
        if input_type.is_integral() {
            Backing::Long(L::default())
        } else {
            Backing::Double(D::default())
        }
    }

    pub fn return_type(&self) -> LogicalType {
        match self {
            Backing::Long(_) => i64::RESULT_TYPE,
            Backing::Double(_) => f64::RESULT_TYPE,
        }
    }

    pub fn add(&mut self, value: &Value) -> PrismStreamResult<Value> {
        Ok(match self {
            Backing::Long(acc) => acc.add(i64::widen(value)?),
            Backing::Double(acc) => acc.add(f64::widen(value)?),
        })
    }

    pub fn remove(&mut self, value: &Value) -> PrismStreamResult<Value> {
        Ok(match self {
            Backing::Long(acc) => acc.remove(i64::widen(value)?),
            Backing::Double(acc) => acc.remove(f64::widen(value)?),
        })
    }

    pub fn result(&self) -> Value {
        match self {
            Backing::Long(acc) => acc.result(),
            Backing::Double(acc) => acc.result(),
        }
    }

    pub fn reset(&mut self) -> Value {
        match self {
            Backing::Long(acc) => acc.reset(),
            Backing::Double(acc) => acc.reset(),
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        match self {
            Backing::Long(acc) => acc.snapshot(),
            Backing::Double(acc) => acc.snapshot(),
        }
    }

    pub fn restore(&mut self, state: &StateSnapshot) -> PrismStreamResult<()> {
        match self {
            Backing::Long(acc) => acc.restore(state),
            Backing::Double(acc) => acc.restore(state),
        }
    }
}
