//! Encoding of checkpoint state to bytes
//!
//! JSON is human readable and tolerant of fields added by later versions;
//! non-finite floats are written as `"NaN"`, `"Infinity"` or `"-Infinity"`.
//! The binary form (bincode, standard config) is compact but positional.

use crate::checkpoint::Snapshot;
use crate::common::error::{PrismStreamError, PrismStreamResult};
use crate::malformed_state_err;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte format used for persisted checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Json,
    Binary,
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotFormat::Json => write!(f, "json"),
            SnapshotFormat::Binary => write!(f, "binary"),
        }
    }
}

impl FromStr for SnapshotFormat {
    type Err = PrismStreamError;

    fn from_str(s: &str) -> PrismStreamResult<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(SnapshotFormat::Json),
            "binary" | "bincode" => Ok(SnapshotFormat::Binary),
            other => Err(PrismStreamError::InvalidArgument(format!(
                "Unknown snapshot format: {}",
                other
            ))),
        }
    }
}

/// Checkpoint payloads carrying a snapshot version
pub trait Versioned {
    /// Validate the version after decoding
    fn check_version(&self) -> PrismStreamResult<()>;
}

impl Versioned for Snapshot {
    fn check_version(&self) -> PrismStreamResult<()> {
        Snapshot::check_version(self)
    }
}

/// Encode a checkpoint payload
pub fn encode<T: Serialize>(payload: &T, format: SnapshotFormat) -> PrismStreamResult<Vec<u8>> {
    match format {
        SnapshotFormat::Json => serde_json::to_vec_pretty(payload)
            .map_err(|e| PrismStreamError::Serialization(e.to_string())),
        SnapshotFormat::Binary => bincode::serde::encode_to_vec(payload, bincode::config::standard())
            .map_err(|e| PrismStreamError::Serialization(e.to_string())),
    }
}

/// Decode a checkpoint payload, rejecting malformed bytes and newer versions
pub fn decode<T>(bytes: &[u8], format: SnapshotFormat) -> PrismStreamResult<T>
where
    T: DeserializeOwned + Versioned,
{
    let payload: T = match format {
        SnapshotFormat::Json => serde_json::from_slice(bytes)
            .map_err(|e| malformed_state_err!("invalid {} checkpoint: {}", format, e))?,
        SnapshotFormat::Binary => {
            let (payload, read) =
                bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                    .map_err(|e| malformed_state_err!("invalid {} checkpoint: {}", format, e))?;
            if read != bytes.len() {
                return Err(malformed_state_err!(
                    "invalid {} checkpoint: {} trailing bytes",
                    format,
                    bytes.len() - read
                ));
            }
            payload
        }
    };
    payload.check_version()?;
    Ok(payload)
}
