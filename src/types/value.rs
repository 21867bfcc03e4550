use crate::common::error::{PrismStreamError, PrismStreamResult};
use crate::types::logical_type::LogicalType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single attribute value flowing into or out of an aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value (type is stored separately)
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    BigInt(i64),
    /// 32-bit floating point
    Float(#[serde(with = "crate::common::float_serde")] f32),
    /// 64-bit double precision
    Double(#[serde(with = "crate::common::float_serde")] f64),
    /// String value
    Varchar(String),
    /// List value
    List(Vec<Value>),
    /// Struct value with field values
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Get the logical type of this value
    pub fn get_type(&self) -> LogicalType {
        match self {
            Value::Null => LogicalType::Null,
            Value::Boolean(_) => LogicalType::Boolean,
            Value::Integer(_) => LogicalType::Integer,
            Value::BigInt(_) => LogicalType::BigInt,
            Value::Float(_) => LogicalType::Float,
            Value::Double(_) => LogicalType::Double,
            Value::Varchar(_) => LogicalType::Varchar,
            Value::List(values) => match values.first() {
                Some(first) => LogicalType::List(Box::new(first.get_type())),
                None => LogicalType::List(Box::new(LogicalType::Null)),
            },
            Value::Struct(fields) => LogicalType::Struct(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.get_type()))
                    .collect(),
            ),
        }
    }

    /// Try to extract an i64 value, widening 32-bit integers
    pub fn try_as_i64(&self) -> PrismStreamResult<i64> {
        match self {
            Value::BigInt(value) => Ok(*value),
            Value::Integer(value) => Ok(i64::from(*value)),
            Value::Null => Err(PrismStreamError::Type(
                "Cannot extract i64 from NULL".to_string(),
            )),
            _ => Err(PrismStreamError::Type(format!(
                "Cannot extract i64 from {}",
                self.get_type()
            ))),
        }
    }

    /// Try to extract an f64 value, widening any numeric variant
    pub fn try_as_f64(&self) -> PrismStreamResult<f64> {
        match self {
            Value::Double(value) => Ok(*value),
            Value::Float(value) => Ok(f64::from(*value)),
            Value::BigInt(value) => Ok(*value as f64),
            Value::Integer(value) => Ok(f64::from(*value)),
            Value::Null => Err(PrismStreamError::Type(
                "Cannot extract f64 from NULL".to_string(),
            )),
            _ => Err(PrismStreamError::Type(format!(
                "Cannot extract f64 from {}",
                self.get_type()
            ))),
        }
    }

    /// Create an integer value
    pub fn integer(value: i32) -> Self {
        Value::Integer(value)
    }

    /// Create a big integer value
    pub fn bigint(value: i64) -> Self {
        Value::BigInt(value)
    }

    /// Create a float value
    pub fn float(value: f32) -> Self {
        Value::Float(value)
    }

    /// Create a double value
    pub fn double(value: f64) -> Self {
        Value::Double(value)
    }

    /// Create a string value
    pub fn varchar(value: impl Into<String>) -> Self {
        Value::Varchar(value.into())
    }

    /// Parse raw text (a CSV cell, a CLI argument) as a value of the given type
    pub fn parse_as(text: &str, target_type: &LogicalType) -> PrismStreamResult<Value> {
        let text = text.trim();
        let invalid = || {
            PrismStreamError::InvalidArgument(format!(
                "Cannot parse '{}' as {}",
                text, target_type
            ))
        };
        match target_type {
            LogicalType::Integer => text.parse::<i32>().map(Value::Integer).map_err(|_| invalid()),
            LogicalType::BigInt => text.parse::<i64>().map(Value::BigInt).map_err(|_| invalid()),
            LogicalType::Float => text.parse::<f32>().map(Value::Float).map_err(|_| invalid()),
            LogicalType::Double => text.parse::<f64>().map(Value::Double).map_err(|_| invalid()),
            LogicalType::Boolean => text.parse::<bool>().map(Value::Boolean).map_err(|_| invalid()),
            LogicalType::Varchar => Ok(Value::Varchar(text.to_string())),
            _ => Err(PrismStreamError::InvalidArgument(format!(
                "Cannot parse text as {}",
                target_type
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Integer(value) => write!(f, "{}", value),
            Value::BigInt(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Double(value) => write!(f, "{}", value),
            Value::Varchar(value) => write!(f, "'{}'", value),
            Value::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
