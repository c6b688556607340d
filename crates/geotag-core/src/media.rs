use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::metadata::Coordinate;

/// One photo on its way from the source tree to the destination tree.
#[derive(Debug, Clone)]
pub struct PhotoRecord {
    /// Absolute path of the source file
    pub source_path: PathBuf,
    /// Path relative to the source root; also the path under the destination root
    pub relative_path: PathBuf,
    /// Best-effort capture time on the naive wall-clock scale
    pub capture_timestamp: NaiveDateTime,
    /// Whether the source already carries GPS tags
    pub has_existing_gps: bool,
    /// Nearest timeline position, `None` when the timeline is empty
    pub coordinate: Option<Coordinate>,
}
