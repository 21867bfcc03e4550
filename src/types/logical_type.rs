use crate::common::error::{PrismStreamError, PrismStreamResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical types are the declared attribute types of stream definitions.
/// Upstream expressions report one of these as their return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// NULL type
    Null,
    /// Boolean type (TRUE/FALSE)
    Boolean,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// 32-bit floating point
    Float,
    /// 64-bit double precision
    Double,
    /// Variable length string
    Varchar,
    /// Opaque host object
    Object,
    /// List type with element type
    List(Box<LogicalType>),
    /// Struct type with named fields
    Struct(Vec<(String, LogicalType)>),
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Null => write!(f, "NULL"),
            LogicalType::Boolean => write!(f, "BOOLEAN"),
            LogicalType::Integer => write!(f, "INTEGER"),
            LogicalType::BigInt => write!(f, "BIGINT"),
            LogicalType::Float => write!(f, "FLOAT"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::Varchar => write!(f, "VARCHAR"),
            LogicalType::Object => write!(f, "OBJECT"),
            LogicalType::List(element_type) => write!(f, "{}[]", element_type),
            LogicalType::Struct(fields) => {
                write!(f, "STRUCT(")?;
                for (i, (name, field_type)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", name, field_type)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl FromStr for LogicalType {
    type Err = PrismStreamError;

    /// Parse the attribute type names used in stream definitions
    fn from_str(s: &str) -> PrismStreamResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "int" | "integer" => Ok(LogicalType::Integer),
            "long" | "bigint" => Ok(LogicalType::BigInt),
            "float" => Ok(LogicalType::Float),
            "double" => Ok(LogicalType::Double),
            "bool" | "boolean" => Ok(LogicalType::Boolean),
            "string" | "varchar" => Ok(LogicalType::Varchar),
            "object" => Ok(LogicalType::Object),
            other => Err(PrismStreamError::InvalidArgument(format!(
                "Unknown attribute type: {}",
                other
            ))),
        }
    }
}
