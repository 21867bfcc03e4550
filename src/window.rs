//! Sliding length window driving aggregators
//!
//! Holds the last `length` input values. Each event is evaluated against the
//! input expression; once the window is full the oldest value is retracted
//! from every aggregator before the new value is added.

use crate::aggregate::AggregatorRef;
use crate::checkpoint::{Snapshot, Versioned};
use crate::common::constants::SNAPSHOT_VERSION;
use crate::common::error::{PrismStreamError, PrismStreamResult};
use crate::expression::ExpressionRef;
use crate::malformed_state_err;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Checkpoint of a length window and all of its aggregators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub version: u32,
    /// Live input values, oldest first
    pub values: Vec<Value>,
    pub aggregators: Vec<Snapshot>,
}

impl Versioned for WindowSnapshot {
    fn check_version(&self) -> PrismStreamResult<()> {
        if self.version == 0 || self.version > SNAPSHOT_VERSION {
            return Err(malformed_state_err!(
                "unsupported window snapshot version {} (supported: 1..={})",
                self.version,
                SNAPSHOT_VERSION
            ));
        }
        self.aggregators.iter().try_for_each(Snapshot::check_version)
    }
}

#[derive(Debug)]
pub struct LengthWindow {
    length: usize,
    input: ExpressionRef,
    values: VecDeque<Value>,
    aggregators: Vec<AggregatorRef>,
}

impl LengthWindow {
    pub fn new(
        length: usize,
        input: ExpressionRef,
        aggregators: Vec<AggregatorRef>,
    ) -> PrismStreamResult<Self> {
        if length == 0 {
            return Err(PrismStreamError::InvalidArgument(
                "window length must be at least 1".to_string(),
            ));
        }
        debug!(length, aggregators = aggregators.len(), input = %input.return_type(), "created length window");
        Ok(Self {
            length,
            input,
            values: VecDeque::with_capacity(length),
            aggregators,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of events currently in the window
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn start(&mut self) {
        self.aggregators.iter_mut().for_each(|a| a.start());
    }

    pub fn stop(&mut self) {
        self.aggregators.iter_mut().for_each(|a| a.stop());
    }

    /// Feed one event row; returns every aggregator's updated result
    pub fn process(&mut self, row: &[Value]) -> PrismStreamResult<Vec<Value>> {
        let value = self.input.evaluate_row(row)?;
        self.check_value(&value)
            .map_err(|err| PrismStreamError::Type(err.to_string()))?;

        if self.values.len() == self.length {
            if let Some(expired) = self.values.pop_front() {
                trace!(%expired, "evicting from window");
                for aggregator in &mut self.aggregators {
                    aggregator.process_remove(&expired)?;
                }
            }
        }

        trace!(%value, "adding to window");
        let results = self
            .aggregators
            .iter_mut()
            .map(|aggregator| aggregator.process_add(&value))
            .collect::<PrismStreamResult<Vec<_>>>()?;
        self.values.push_back(value);
        Ok(results)
    }

    /// Empty the window and reset every aggregator
    pub fn reset(&mut self) -> Vec<Value> {
        self.values.clear();
        self.aggregators.iter_mut().map(|a| a.reset()).collect()
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            version: SNAPSHOT_VERSION,
            values: self.values.iter().cloned().collect(),
            aggregators: self.aggregators.iter().map(|a| a.snapshot()).collect(),
        }
    }

    /// Restore the window and its aggregators; on error nothing changes
    pub fn restore(&mut self, snapshot: &WindowSnapshot) -> PrismStreamResult<()> {
        snapshot.check_version()?;
        if snapshot.values.len() > self.length {
            return Err(malformed_state_err!(
                "window snapshot holds {} values, window length is {}",
                snapshot.values.len(),
                self.length
            ));
        }
        if snapshot.aggregators.len() != self.aggregators.len() {
            return Err(malformed_state_err!(
                "window snapshot has {} aggregators, window has {}",
                snapshot.aggregators.len(),
                self.aggregators.len()
            ));
        }
        for value in &snapshot.values {
            self.check_value(value)?;
        }

        let saved: Vec<Snapshot> = self.aggregators.iter().map(|a| a.snapshot()).collect();
        for (index, state) in snapshot.aggregators.iter().enumerate() {
            if let Err(err) = self.aggregators[index].restore(state) {
                warn!(index, error = %err, "window restore failed; rolling back");
                for (aggregator, previous) in self.aggregators.iter_mut().zip(&saved).take(index) {
                    aggregator.restore(previous)?;
                }
                return Err(err);
            }
        }
        self.values = snapshot.values.iter().cloned().collect();
        debug!(values = self.values.len(), "restored length window");
        Ok(())
    }

    fn check_value(&self, value: &Value) -> PrismStreamResult<()> {
        let declared = self.input.return_type();
        if &value.get_type() != declared {
            return Err(malformed_state_err!(
                "expected {} value, found {}",
                declared,
                value.get_type()
            ));
        }
        Ok(())
    }
}
