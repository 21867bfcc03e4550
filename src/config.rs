//! Stream runtime configuration

use crate::checkpoint::SnapshotFormat;
use crate::common::constants::{DEFAULT_LOG_FILTER, DEFAULT_WINDOW_LENGTH};
use crate::common::error::{PrismStreamError, PrismStreamResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Number of events held by the length window
    pub window_length: usize,
    /// Byte format of checkpoint files
    pub snapshot_format: SnapshotFormat,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl StreamConfig {
    /// Load a configuration from a JSON file; absent keys take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> PrismStreamResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: StreamConfig = serde_json::from_str(&text).map_err(|e| {
            PrismStreamError::InvalidArgument(format!(
                "invalid config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PrismStreamResult<()> {
        if self.window_length == 0 {
            return Err(PrismStreamError::InvalidArgument(
                "window_length must be at least 1".to_string(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(PrismStreamError::InvalidArgument(
                "log_level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            window_length: DEFAULT_WINDOW_LENGTH,
            snapshot_format: SnapshotFormat::Json,
            log_level: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
