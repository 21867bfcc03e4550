//! Expression interface consumed by aggregators
//!
//! Aggregators never evaluate their input themselves. They query the declared
//! return type of their single input expression once at init, and the caller
//! evaluates the expression per event and hands the resulting value in.

pub mod expression;

pub use expression::*;

use crate::common::error::PrismStreamResult;
use crate::types::{LogicalType, Value};
use std::sync::Arc;

/// Expression reference type
pub type ExpressionRef = Arc<dyn Expression>;

/// Upstream value-producing expression
pub trait Expression: std::fmt::Debug + Send + Sync {
    /// Get the statically-declared return type of this expression
    fn return_type(&self) -> &LogicalType;

    /// Evaluate this expression against a single event row
    fn evaluate_row(&self, row: &[Value]) -> PrismStreamResult<Value>;
}
