//! Type system module
//!
//! This module contains the attribute type components aggregators work with:
//! - LogicalType: declared attribute types of stream definitions
//! - Value: single attribute values with type information
//! - NumericType / Working: resolved numeric inputs and their widened working types

pub mod logical_type;
pub mod numeric;
pub mod value;

pub use logical_type::LogicalType;
pub use numeric::{NumericType, Working};
pub use value::Value;
