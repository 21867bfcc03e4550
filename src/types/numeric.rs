//! Numeric input types and the 64-bit working types accumulators compute in
//!
//! Every numeric aggregate accepts one of four declared input types. Rather
//! than specializing each aggregate per input type, accumulators are generic
//! over a [`Working`] type (`i64` or `f64`) and the input is widened once at
//! the aggregator boundary.

use crate::checkpoint::SnapshotWorking;
use crate::common::error::{PrismStreamError, PrismStreamResult};
use crate::types::{LogicalType, Value};
use num_traits::Zero;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared input type of a numeric aggregate, resolved once at init
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericType {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl NumericType {
    /// Resolve the declared type of an input expression
    pub fn resolve(declared: &LogicalType) -> PrismStreamResult<Self> {
        match declared {
            LogicalType::Integer => Ok(NumericType::Int32),
            LogicalType::BigInt => Ok(NumericType::Int64),
            LogicalType::Float => Ok(NumericType::Float32),
            LogicalType::Double => Ok(NumericType::Float64),
            other => Err(PrismStreamError::UnsupportedType(format!(
                "{} is not a numeric input type",
                other
            ))),
        }
    }

    /// The logical type this numeric type was resolved from
    pub fn logical_type(self) -> LogicalType {
        match self {
            NumericType::Int32 => LogicalType::Integer,
            NumericType::Int64 => LogicalType::BigInt,
            NumericType::Float32 => LogicalType::Float,
            NumericType::Float64 => LogicalType::Double,
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(self, NumericType::Int32 | NumericType::Int64)
    }

    /// Check that a per-event value carries exactly the declared variant
    pub fn check(self, value: &Value) -> PrismStreamResult<()> {
        let matches = matches!(
            (self, value),
            (NumericType::Int32, Value::Integer(_))
                | (NumericType::Int64, Value::BigInt(_))
                | (NumericType::Float32, Value::Float(_))
                | (NumericType::Float64, Value::Double(_))
        );
        if matches {
            Ok(())
        } else {
            Err(PrismStreamError::Type(format!(
                "expected {} value, found {}",
                self.logical_type(),
                value.get_type()
            )))
        }
    }
}

impl TryFrom<&LogicalType> for NumericType {
    type Error = PrismStreamError;

    fn try_from(declared: &LogicalType) -> PrismStreamResult<Self> {
        NumericType::resolve(declared)
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.logical_type())
    }
}

/// 64-bit representation an accumulator runs its arithmetic in
pub trait Working:
    Copy + PartialOrd + Zero + fmt::Debug + Send + Sync + SnapshotWorking + 'static
{
    /// Result type of accumulators working in this representation
    const RESULT_TYPE: LogicalType;

    /// Totally ordered key used by order-based accumulators
    type Key: Ord + Copy + fmt::Debug + Send + Sync;

    /// Widen an already type-checked input value
    fn widen(value: &Value) -> PrismStreamResult<Self>;

    fn accumulate(self, rhs: Self) -> Self;

    fn retract(self, rhs: Self) -> Self;

    fn into_value(self) -> Value;

    /// Read a value of exactly this representation, without coercion
    fn from_exact(value: &Value) -> Option<Self>;

    fn key(self) -> Self::Key;

    fn from_key(key: Self::Key) -> Self;
}

impl Working for i64 {
    const RESULT_TYPE: LogicalType = LogicalType::BigInt;
    type Key = i64;

    fn widen(value: &Value) -> PrismStreamResult<Self> {
        value.try_as_i64()
    }

    // Overflow wraps, matching the native semantics of the result type
    fn accumulate(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn retract(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    fn into_value(self) -> Value {
        Value::BigInt(self)
    }

    fn from_exact(value: &Value) -> Option<Self> {
        match value {
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    fn key(self) -> i64 {
        self
    }

    fn from_key(key: i64) -> Self {
        key
    }
}

impl Working for f64 {
    const RESULT_TYPE: LogicalType = LogicalType::Double;
    type Key = OrderedFloat<f64>;

    fn widen(value: &Value) -> PrismStreamResult<Self> {
        value.try_as_f64()
    }

    fn accumulate(self, rhs: Self) -> Self {
        self + rhs
    }

    fn retract(self, rhs: Self) -> Self {
        self - rhs
    }

    fn into_value(self) -> Value {
        Value::Double(self)
    }

    fn from_exact(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn key(self) -> OrderedFloat<f64> {
        OrderedFloat(self)
    }

    fn from_key(key: OrderedFloat<f64>) -> Self {
        key.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_numeric_types() -> PrismStreamResult<()> {
        assert_eq!(NumericType::resolve(&LogicalType::Integer)?, NumericType::Int32);
        assert_eq!(NumericType::resolve(&LogicalType::BigInt)?, NumericType::Int64);
        assert_eq!(NumericType::resolve(&LogicalType::Float)?, NumericType::Float32);
        assert_eq!(NumericType::resolve(&LogicalType::Double)?, NumericType::Float64);

        let err = NumericType::resolve(&LogicalType::Varchar).unwrap_err();
        assert!(matches!(err, PrismStreamError::UnsupportedType(_)));
        Ok(())
    }

    #[test]
    fn test_check_rejects_other_variants() {
        assert!(NumericType::Int32.check(&Value::integer(1)).is_ok());
        assert!(NumericType::Int32.check(&Value::bigint(1)).is_err());
        assert!(NumericType::Float32.check(&Value::double(1.0)).is_err());
        assert!(NumericType::Float64.check(&Value::Null).is_err());
    }

    #[test]
    fn test_integer_accumulation_wraps() {
        assert_eq!(i64::MAX.accumulate(1), i64::MIN);
        assert_eq!(i64::MIN.retract(1), i64::MAX);
    }

    #[test]
    fn test_exact_reads_do_not_coerce() {
        assert_eq!(i64::from_exact(&Value::bigint(5)), Some(5));
        assert_eq!(i64::from_exact(&Value::integer(5)), None);
        assert_eq!(f64::from_exact(&Value::double(0.5)), Some(0.5));
        assert_eq!(f64::from_exact(&Value::bigint(1)), None);
    }

    #[test]
    fn test_float_widening_is_exact() -> PrismStreamResult<()> {
        let widened = f64::widen(&Value::float(0.1))?;
        assert_eq!(widened, f64::from(0.1f32));
        Ok(())
    }
}
