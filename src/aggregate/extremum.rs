//! Minimum and maximum under retraction
//!
//! Removing the current extremum must expose the next one, so the live values
//! are kept as an ordered multiset rather than a single running value.

use crate::aggregate::{
    checked, resolve_numeric_input, restore_checked, Accumulator, AggregateKind,
    AttributeAggregator, Backing,
};
use crate::checkpoint::{ExtremumEntry, ExtremumSnapshot, Snapshot, StateSnapshot};
use crate::common::error::PrismStreamResult;
use crate::expression::ExpressionRef;
use crate::malformed_state_err;
use crate::types::{LogicalType, NumericType, Value, Working};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Live values with multiplicities; `MAX` selects the reported end
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremumAccumulator<T: Working, const MAX: bool> {
    values: BTreeMap<T::Key, i64>,
}

impl<T: Working, const MAX: bool> Default for ExtremumAccumulator<T, MAX> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<T: Working, const MAX: bool> ExtremumAccumulator<T, MAX> {
    /// Number of live values, duplicates included
    pub fn len(&self) -> i64 {
        self.values.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Working, const MAX: bool> Accumulator<T> for ExtremumAccumulator<T, MAX> {
    fn add(&mut self, value: T) -> Value {
        // -0.0 and 0.0 share one key; the entry keeps the sign of the first one added
        *self.values.entry(value.key()).or_insert(0) += 1;
        self.result()
    }

    fn remove(&mut self, value: T) -> Value {
        match self.values.entry(value.key()) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut() -= 1;
                if *entry.get() == 0 {
                    entry.remove();
                }
            }
            Entry::Vacant(_) => {
                warn!(?value, "removed a value that is not live; ignoring");
            }
        }
        self.result()
    }

    /// Null while empty
    fn result(&self) -> Value {
        let end = if MAX {
            self.values.last_key_value()
        } else {
            self.values.first_key_value()
        };
        end.map_or(Value::Null, |(key, _)| T::from_key(*key).into_value())
    }

    fn snapshot(&self) -> StateSnapshot {
        let values = self
            .values
            .iter()
            .map(|(key, count)| ExtremumEntry {
                value: T::from_key(*key),
                count: *count,
            })
            .collect();
        T::extremum_state(ExtremumSnapshot { values })
    }

    fn restore(&mut self, state: &StateSnapshot) -> PrismStreamResult<()> {
        let snapshot =
            T::extremum_from_state(state).ok_or_else(|| state.mismatch(T::extremum_layout()))?;
        let mut values = BTreeMap::new();
        for entry in &snapshot.values {
            if entry.count <= 0 {
                return Err(malformed_state_err!(
                    "{} snapshot has non-positive count {} for {:?}",
                    T::extremum_layout(),
                    entry.count,
                    entry.value
                ));
            }
            if values.insert(entry.value.key(), entry.count).is_some() {
                return Err(malformed_state_err!(
                    "{} snapshot repeats value {:?}",
                    T::extremum_layout(),
                    entry.value
                ));
            }
        }
        self.values = values;
        Ok(())
    }
}

type ExtremumBacking<const MAX: bool> =
    Backing<ExtremumAccumulator<i64, MAX>, ExtremumAccumulator<f64, MAX>>;

/// `min(x)` or `max(x)` over int, long, float or double input
#[derive(Debug)]
pub struct ExtremumAggregator<const MAX: bool> {
    input_type: NumericType,
    return_type: LogicalType,
    backing: ExtremumBacking<MAX>,
}

pub type MinAggregator = ExtremumAggregator<false>;
pub type MaxAggregator = ExtremumAggregator<true>;

impl<const MAX: bool> ExtremumAggregator<MAX> {
    const KIND: AggregateKind = if MAX {
        AggregateKind::Max
    } else {
        AggregateKind::Min
    };

    pub fn init(inputs: &[ExpressionRef]) -> PrismStreamResult<Self> {
        let kind = Self::KIND;
        let input_type = resolve_numeric_input(kind, inputs)?;
        let backing = ExtremumBacking::<MAX>::for_input(input_type);
        let return_type = backing.return_type();
        debug!(aggregate = %kind, input = %input_type, result = %return_type, "resolved aggregator backing");
        Ok(Self {
            input_type,
            return_type,
            backing,
        })
    }
}

impl<const MAX: bool> AttributeAggregator for ExtremumAggregator<MAX> {
    fn kind(&self) -> AggregateKind {
        Self::KIND
    }

    fn return_type(&self) -> &LogicalType {
        &self.return_type
    }

    fn process_add(&mut self, value: &Value) -> PrismStreamResult<Value> {
        self.backing.add(checked(Self::KIND, self.input_type, value)?)
    }

    fn process_remove(&mut self, value: &Value) -> PrismStreamResult<Value> {
        self.backing.remove(checked(Self::KIND, self.input_type, value)?)
    }

    fn reset(&mut self) -> Value {
        self.backing.reset()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.backing.snapshot())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> PrismStreamResult<()> {
        let backing = &mut self.backing;
        restore_checked(Self::KIND, snapshot, |state| backing.restore(state))
    }
}
