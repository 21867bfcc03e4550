//! Core expression types

use crate::common::error::{PrismStreamError, PrismStreamResult};
use crate::expression::{Expression, ExpressionRef};
use crate::types::{LogicalType, Value};
use std::sync::Arc;

/// Constant value expression
#[derive(Debug, Clone)]
pub struct ConstantExpression {
    return_type: LogicalType,
    value: Value,
}

impl ConstantExpression {
    pub fn new(value: Value) -> Self {
        Self {
            return_type: value.get_type(),
            value,
        }
    }

    pub fn into_ref(self) -> ExpressionRef {
        Arc::new(self)
    }
}

impl Expression for ConstantExpression {
    fn return_type(&self) -> &LogicalType {
        &self.return_type
    }

    fn evaluate_row(&self, _row: &[Value]) -> PrismStreamResult<Value> {
        Ok(self.value.clone())
    }
}

/// Reference to one attribute of the incoming event
#[derive(Debug, Clone)]
pub struct ColumnRefExpression {
    return_type: LogicalType,
    column_index: usize,
    column_name: String,
}

impl ColumnRefExpression {
    pub fn new(column_index: usize, column_name: impl Into<String>, return_type: LogicalType) -> Self {
        Self {
            return_type,
            column_index,
            column_name: column_name.into(),
        }
    }

    pub fn column_index(&self) -> usize {
        self.column_index
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn into_ref(self) -> ExpressionRef {
        Arc::new(self)
    }
}

impl Expression for ColumnRefExpression {
    fn return_type(&self) -> &LogicalType {
        &self.return_type
    }

    fn evaluate_row(&self, row: &[Value]) -> PrismStreamResult<Value> {
        row.get(self.column_index).cloned().ok_or_else(|| {
            PrismStreamError::InvalidArgument(format!(
                "Column {} ({}) out of bounds (columns: {})",
                self.column_index,
                self.column_name,
                row.len()
            ))
        })
    }
}
