//! Constants used throughout prism-stream

/// Version written into every snapshot; restore rejects anything newer
pub const SNAPSHOT_VERSION: u32 = 1;

/// Default number of events held by a length window
pub const DEFAULT_WINDOW_LENGTH: usize = 10;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Snapshot field names shared by the typed and field-view forms
pub mod fields {
    pub const SUM: &str = "Sum";
    pub const MEAN: &str = "Mean";
    pub const OLD_MEAN: &str = "OldMean";
    pub const STD_DEVIATION: &str = "StdDeviation";
    pub const COUNT: &str = "Count";
    pub const VALUES: &str = "Values";
    pub const VALUE: &str = "Value";
}
