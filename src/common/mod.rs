//! Common utilities and shared components

pub mod constants;
pub mod error;
pub mod float_serde;

pub use constants::*;
pub use error::*;
