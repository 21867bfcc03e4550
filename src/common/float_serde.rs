//! Serde representation of checkpoint scalars that survives non-finite floats
//!
//! JSON has no literal for NaN or the infinities, so human-readable formats
//! write them as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`. Finite
//! values stay plain numbers. Binary formats carry the raw float.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

/// Scalar stored in a checkpoint field
pub trait CheckpointScalar: Sized {
    fn serialize_scalar<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>;

    fn deserialize_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error>;
}

impl CheckpointScalar for i64 {
    fn serialize_scalar<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(self, serializer)
    }

    fn deserialize_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <i64 as Deserialize>::deserialize(deserializer)
    }
}

impl CheckpointScalar for f64 {
    fn serialize_scalar<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !serializer.is_human_readable() || self.is_finite() {
            return serializer.serialize_f64(*self);
        }
        serializer.serialize_str(non_finite_name(*self))
    }

    fn deserialize_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(FloatVisitor)
        } else {
            <f64 as Deserialize>::deserialize(deserializer)
        }
    }
}

impl CheckpointScalar for f32 {
    fn serialize_scalar<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !serializer.is_human_readable() || self.is_finite() {
            return serializer.serialize_f32(*self);
        }
        serializer.serialize_str(non_finite_name(f64::from(*self)))
    }

    fn deserialize_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(FloatVisitor).map(|v| v as f32)
        } else {
            <f32 as Deserialize>::deserialize(deserializer)
        }
    }
}

fn non_finite_name(value: f64) -> &'static str {
    if value.is_nan() {
        NAN
    } else if value.is_sign_positive() {
        INFINITY
    } else {
        NEG_INFINITY
    }
}

struct FloatVisitor;

impl<'de> Visitor<'de> for FloatVisitor {
    type Value = f64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a number or one of \"{}\", \"{}\", \"{}\"", NAN, INFINITY, NEG_INFINITY)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        match v {
            NAN => Ok(f64::NAN),
            INFINITY => Ok(f64::INFINITY),
            NEG_INFINITY => Ok(f64::NEG_INFINITY),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}

/// `#[serde(with = ...)]` entry point for a scalar field
pub fn serialize<T: CheckpointScalar, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    value.serialize_scalar(serializer)
}

/// `#[serde(with = ...)]` entry point for a scalar field
pub fn deserialize<'de, T: CheckpointScalar, D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
    T::deserialize_scalar(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Field {
        #[serde(with = "crate::common::float_serde")]
        value: f64,
    }

    #[test]
    fn test_non_finite_json_uses_names() -> serde_json::Result<()> {
        for (value, text) in [
            (f64::INFINITY, r#"{"value":"Infinity"}"#),
            (f64::NEG_INFINITY, r#"{"value":"-Infinity"}"#),
            (f64::NAN, r#"{"value":"NaN"}"#),
            (1.5, r#"{"value":1.5}"#),
        ] {
            assert_eq!(serde_json::to_string(&Field { value })?, text);
        }
        Ok(())
    }

    #[test]
    fn test_json_accepts_integers_and_names() -> serde_json::Result<()> {
        let field: Field = serde_json::from_str(r#"{"value":3}"#)?;
        assert_eq!(field.value, 3.0);
        let field: Field = serde_json::from_str(r#"{"value":"NaN"}"#)?;
        assert!(field.value.is_nan());
        assert!(serde_json::from_str::<Field>(r#"{"value":"nan"}"#).is_err());
        assert!(serde_json::from_str::<Field>(r#"{"value":null}"#).is_err());
        Ok(())
    }
}
