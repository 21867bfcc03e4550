//! Checkpoint state of aggregators
//!
//! Every accumulator externalizes its state as a [`Snapshot`]: a version
//! number plus one fixed, typed [`StateSnapshot`] variant per aggregate kind
//! and working type. Serde field names follow the checkpoint schema
//! (`Sum`, `Mean`, `OldMean`, `StdDeviation`, `Count`, `Values`).
//!
//! Engines that persist string-keyed state can use the ordered field view
//! ([`Snapshot::fields`] / [`Snapshot::from_fields`]). Rebuilding from fields
//! is strict: a missing field or a field of the wrong value variant is a
//! `MalformedState` error, never a silent coercion.

pub mod codec;

pub use codec::{decode, encode, SnapshotFormat, Versioned};

use crate::common::constants::{fields, SNAPSHOT_VERSION};
use crate::common::float_serde::{self, CheckpointScalar};
use crate::common::error::PrismStreamResult;
use crate::malformed_state_err;
use crate::types::{Value, Working};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered name/value view of a snapshot
pub type SnapshotFields = Vec<(String, Value)>;

/// Versioned checkpoint of one aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub state: StateSnapshot,
}

/// Typed accumulator state, one variant per aggregate kind and working type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateSnapshot {
    SumLong(SumSnapshot<i64>),
    SumDouble(SumSnapshot<f64>),
    Stddev(StddevSnapshot),
    Avg(AvgSnapshot),
    Count(CountSnapshot),
    ExtremumLong(ExtremumSnapshot<i64>),
    ExtremumDouble(ExtremumSnapshot<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: CheckpointScalar")]
pub struct SumSnapshot<T> {
    #[serde(rename = "Sum", with = "float_serde")]
    pub sum: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StddevSnapshot {
    #[serde(rename = "Sum", with = "float_serde")]
    pub sum: f64,
    #[serde(rename = "Mean", with = "float_serde")]
    pub mean: f64,
    #[serde(rename = "OldMean", with = "float_serde")]
    pub previous_mean: f64,
    #[serde(rename = "StdDeviation", with = "float_serde")]
    pub sum_of_squared_deviation: f64,
    #[serde(rename = "Count")]
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AvgSnapshot {
    #[serde(rename = "Sum", with = "float_serde")]
    pub sum: f64,
    #[serde(rename = "Count")]
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CountSnapshot {
    #[serde(rename = "Count")]
    pub count: i64,
}

/// Live values of a min/max accumulator in ascending order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: CheckpointScalar")]
pub struct ExtremumSnapshot<T> {
    #[serde(rename = "Values")]
    pub values: Vec<ExtremumEntry<T>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: CheckpointScalar")]
pub struct ExtremumEntry<T> {
    #[serde(rename = "Value", with = "float_serde")]
    pub value: T,
    #[serde(rename = "Count")]
    pub count: i64,
}

/// Shape of a [`StateSnapshot`], needed to rebuild one from its field view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotLayout {
    SumLong,
    SumDouble,
    Stddev,
    Avg,
    Count,
    ExtremumLong,
    ExtremumDouble,
}

impl fmt::Display for SnapshotLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SnapshotLayout::SumLong => "sum(long)",
            SnapshotLayout::SumDouble => "sum(double)",
            SnapshotLayout::Stddev => "stddev",
            SnapshotLayout::Avg => "avg",
            SnapshotLayout::Count => "count",
            SnapshotLayout::ExtremumLong => "min/max(long)",
            SnapshotLayout::ExtremumDouble => "min/max(double)",
        };
        write!(f, "{}", name)
    }
}

impl StateSnapshot {
    pub fn layout(&self) -> SnapshotLayout {
        match self {
            StateSnapshot::SumLong(_) => SnapshotLayout::SumLong,
            StateSnapshot::SumDouble(_) => SnapshotLayout::SumDouble,
            StateSnapshot::Stddev(_) => SnapshotLayout::Stddev,
            StateSnapshot::Avg(_) => SnapshotLayout::Avg,
            StateSnapshot::Count(_) => SnapshotLayout::Count,
            StateSnapshot::ExtremumLong(_) => SnapshotLayout::ExtremumLong,
            StateSnapshot::ExtremumDouble(_) => SnapshotLayout::ExtremumDouble,
        }
    }

    /// Error for a snapshot handed to an accumulator of another layout
    pub(crate) fn mismatch(&self, expected: SnapshotLayout) -> crate::common::PrismStreamError {
        malformed_state_err!(
            "expected {} snapshot, found {}",
            expected,
            self.layout()
        )
    }
}

impl Snapshot {
    /// Wrap accumulator state in a snapshot of the current version
    pub fn new(state: StateSnapshot) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state,
        }
    }

    pub fn layout(&self) -> SnapshotLayout {
        self.state.layout()
    }

    /// Reject snapshots written by a newer, incompatible version
    pub fn check_version(&self) -> PrismStreamResult<()> {
        if self.version == 0 || self.version > SNAPSHOT_VERSION {
            return Err(malformed_state_err!(
                "unsupported snapshot version {} (supported: 1..={})",
                self.version,
                SNAPSHOT_VERSION
            ));
        }
        Ok(())
    }

    /// Ordered name/value view of the state
    pub fn fields(&self) -> SnapshotFields {
        let field = |name: &str, value: Value| (name.to_string(), value);
        match &self.state {
            StateSnapshot::SumLong(s) => vec![field(fields::SUM, Value::BigInt(s.sum))],
            StateSnapshot::SumDouble(s) => vec![field(fields::SUM, Value::Double(s.sum))],
            StateSnapshot::Stddev(s) => vec![
                field(fields::SUM, Value::Double(s.sum)),
                field(fields::MEAN, Value::Double(s.mean)),
                field(fields::OLD_MEAN, Value::Double(s.previous_mean)),
                field(fields::STD_DEVIATION, Value::Double(s.sum_of_squared_deviation)),
                field(fields::COUNT, Value::BigInt(s.count)),
            ],
            StateSnapshot::Avg(s) => vec![
                field(fields::SUM, Value::Double(s.sum)),
                field(fields::COUNT, Value::BigInt(s.count)),
            ],
            StateSnapshot::Count(s) => vec![field(fields::COUNT, Value::BigInt(s.count))],
            StateSnapshot::ExtremumLong(s) => vec![field(fields::VALUES, entries_to_value(&s.values))],
            StateSnapshot::ExtremumDouble(s) => vec![field(fields::VALUES, entries_to_value(&s.values))],
        }
    }

    /// Rebuild a snapshot of the given layout from its field view
    pub fn from_fields(layout: SnapshotLayout, view: &[(String, Value)]) -> PrismStreamResult<Self> {
        let reader = FieldReader { layout, view };
        let state = match layout {
            SnapshotLayout::SumLong => StateSnapshot::SumLong(SumSnapshot {
                sum: reader.exact(fields::SUM)?,
            }),
            SnapshotLayout::SumDouble => StateSnapshot::SumDouble(SumSnapshot {
                sum: reader.exact(fields::SUM)?,
            }),
            SnapshotLayout::Stddev => StateSnapshot::Stddev(StddevSnapshot {
                sum: reader.exact(fields::SUM)?,
                mean: reader.exact(fields::MEAN)?,
                previous_mean: reader.exact(fields::OLD_MEAN)?,
                sum_of_squared_deviation: reader.exact(fields::STD_DEVIATION)?,
                count: reader.exact(fields::COUNT)?,
            }),
            SnapshotLayout::Avg => StateSnapshot::Avg(AvgSnapshot {
                sum: reader.exact(fields::SUM)?,
                count: reader.exact(fields::COUNT)?,
            }),
            SnapshotLayout::Count => StateSnapshot::Count(CountSnapshot {
                count: reader.exact(fields::COUNT)?,
            }),
            SnapshotLayout::ExtremumLong => StateSnapshot::ExtremumLong(ExtremumSnapshot {
                values: reader.entries(fields::VALUES)?,
            }),
            SnapshotLayout::ExtremumDouble => StateSnapshot::ExtremumDouble(ExtremumSnapshot {
                values: reader.entries(fields::VALUES)?,
            }),
        };
        Ok(Snapshot::new(state))
    }
}

fn entries_to_value<T: Working>(entries: &[ExtremumEntry<T>]) -> Value {
    Value::List(
        entries
            .iter()
            .map(|entry| {
                Value::Struct(vec![
                    (fields::VALUE.to_string(), entry.value.into_value()),
                    (fields::COUNT.to_string(), Value::BigInt(entry.count)),
                ])
            })
            .collect(),
    )
}

/// Strict typed access to a field view
struct FieldReader<'a> {
    layout: SnapshotLayout,
    view: &'a [(String, Value)],
}

impl FieldReader<'_> {
    fn get(&self, name: &str) -> PrismStreamResult<&Value> {
        lookup(self.view, name)
            .ok_or_else(|| malformed_state_err!("{} snapshot is missing field {}", self.layout, name))
    }

    fn exact<T: Working>(&self, name: &str) -> PrismStreamResult<T> {
        let value = self.get(name)?;
        T::from_exact(value).ok_or_else(|| {
            malformed_state_err!(
                "{} snapshot field {} must be {}, found {}",
                self.layout,
                name,
                T::RESULT_TYPE,
                value.get_type()
            )
        })
    }

    fn entries<T: Working>(&self, name: &str) -> PrismStreamResult<Vec<ExtremumEntry<T>>> {
        let Value::List(items) = self.get(name)? else {
            return Err(malformed_state_err!(
                "{} snapshot field {} must be a list",
                self.layout,
                name
            ));
        };
        items
            .iter()
            .map(|item| {
                let Value::Struct(entry) = item else {
                    return Err(malformed_state_err!(
                        "{} snapshot entries must be structs, found {}",
                        self.layout,
                        item.get_type()
                    ));
                };
                let nested = FieldReader {
                    layout: self.layout,
                    view: entry,
                };
                Ok(ExtremumEntry {
                    value: nested.exact(fields::VALUE)?,
                    count: nested.exact(fields::COUNT)?,
                })
            })
            .collect()
    }
}

fn lookup<'a>(view: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    view.iter()
        .find(|(field, _)| field == name)
        .map(|(_, value)| value)
}

/// Maps a working type onto the snapshot variants generic accumulators produce
pub trait SnapshotWorking: Sized {
    fn sum_state(snapshot: SumSnapshot<Self>) -> StateSnapshot;

    fn sum_from_state(state: &StateSnapshot) -> Option<&SumSnapshot<Self>>;

    fn extremum_state(snapshot: ExtremumSnapshot<Self>) -> StateSnapshot;

    fn extremum_from_state(state: &StateSnapshot) -> Option<&ExtremumSnapshot<Self>>;

    fn sum_layout() -> SnapshotLayout;

    fn extremum_layout() -> SnapshotLayout;
}

impl SnapshotWorking for i64 {
    fn sum_state(snapshot: SumSnapshot<i64>) -> StateSnapshot {
        StateSnapshot::SumLong(snapshot)
    }

    fn sum_from_state(state: &StateSnapshot) -> Option<&SumSnapshot<i64>> {
        match state {
            StateSnapshot::SumLong(s) => Some(s),
            _ => None,
        }
    }

    fn extremum_state(snapshot: ExtremumSnapshot<i64>) -> StateSnapshot {
        StateSnapshot::ExtremumLong(snapshot)
    }

    fn extremum_from_state(state: &StateSnapshot) -> Option<&ExtremumSnapshot<i64>> {
        match state {
            StateSnapshot::ExtremumLong(s) => Some(s),
            _ => None,
        }
    }

    fn sum_layout() -> SnapshotLayout {
        SnapshotLayout::SumLong
    }

    fn extremum_layout() -> SnapshotLayout {
        SnapshotLayout::ExtremumLong
    }
}

impl SnapshotWorking for f64 {
    fn sum_state(snapshot: SumSnapshot<f64>) -> StateSnapshot {
        StateSnapshot::SumDouble(snapshot)
    }

    fn sum_from_state(state: &StateSnapshot) -> Option<&SumSnapshot<f64>> {
        match state {
            StateSnapshot::SumDouble(s) => Some(s),
            _ => None,
        }
    }

    fn extremum_state(snapshot: ExtremumSnapshot<f64>) -> StateSnapshot {
        StateSnapshot::ExtremumDouble(snapshot)
    }

    fn extremum_from_state(state: &StateSnapshot) -> Option<&ExtremumSnapshot<f64>> {
        match state {
            StateSnapshot::ExtremumDouble(s) => Some(s),
            _ => None,
        }
    }

    fn sum_layout() -> SnapshotLayout {
        SnapshotLayout::SumDouble
    }

    fn extremum_layout() -> SnapshotLayout {
        SnapshotLayout::ExtremumDouble
    }
}
