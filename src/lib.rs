//! prism-stream - Incremental attribute aggregation for event streams
//!
//! Running aggregates (sum, standard deviation, average, count, min, max)
//! that are updated as events enter and leave a window, with retraction
//! instead of recomputation and a versioned checkpoint of every
//! aggregator's state.
//!
pub mod aggregate;
pub mod checkpoint;
pub mod common;
pub mod config;
pub mod expression;
pub mod types;
pub mod window;

// Re-export common types for convenience
pub use common::{PrismStreamError, PrismStreamResult};

// Re-export type system for convenience
pub use types::{LogicalType, NumericType, Value, Working};

// Re-export expression interface for convenience
pub use expression::{ColumnRefExpression, ConstantExpression, Expression, ExpressionRef};

// Re-export aggregators for convenience
pub use aggregate::{
    create_aggregator, AggregateKind, AggregatorRef, AttributeAggregator, AvgAggregator,
    CountAggregator, MaxAggregator, MinAggregator, StddevAggregator, SumAggregator,
};

// Re-export checkpoint protocol for convenience
pub use checkpoint::{Snapshot, SnapshotFormat, SnapshotLayout, StateSnapshot};

pub use config::StreamConfig;
pub use window::{LengthWindow, WindowSnapshot};
