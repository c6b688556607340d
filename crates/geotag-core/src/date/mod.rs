pub mod exif;

use std::path::Path;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};

use crate::metadata::TagContainer;

/// Where a capture timestamp came from, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// EXIF `DateTimeOriginal`.
    Original,
    /// EXIF `DateTime`.
    Modified,
    /// Filesystem modification time.
    FileModified,
    /// Nothing was readable; the Unix epoch stands in.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTime {
    pub timestamp: NaiveDateTime,
    pub source: TimeSource,
}

/// Drop the UTC offset of a timeline timestamp, keeping its wall-clock
/// reading. `2025-09-13T17:05:00+09:00` becomes `2025-09-13 17:05:00`.
///
/// Photo timestamps carry no offset, so both sides of a comparison are put
/// on the same naive scale this way. This assumes the camera clock was set
/// to the local time the timeline recorded at that moment. The offset is
/// discarded, never converted to UTC.
pub fn strip_offset(dt: DateTime<FixedOffset>) -> NaiveDateTime {
    dt.naive_local()
}

/// Best-effort capture time for a photo. Never fails.
///
/// Order: `DateTimeOriginal`, then `DateTime`, then the file's mtime in
/// local time.
pub fn capture_timestamp(container: &TagContainer, path: &Path) -> CaptureTime {
    if let Some(timestamp) = exif::original_capture_time(container) {
        return CaptureTime {
            timestamp,
            source: TimeSource::Original,
        };
    }
    if let Some(timestamp) = exif::modification_time(container) {
        return CaptureTime {
            timestamp,
            source: TimeSource::Modified,
        };
    }
    match file_mtime(path) {
        Some(timestamp) => CaptureTime {
            timestamp,
            source: TimeSource::FileModified,
        },
        None => {
            tracing::warn!(path = %path.display(), "no usable timestamp, using epoch");
            CaptureTime {
                timestamp: NaiveDateTime::default(),
                source: TimeSource::Unknown,
            }
        }
    }
}

/// File modification time as a local wall-clock value.
pub fn file_mtime(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{TagGroup, DATE_TIME, DATE_TIME_ORIGINAL};
    use ::exif::Value;
    use chrono::TimeZone;
    use std::fs::File;
    use tempfile::tempdir;

    fn ascii(s: &str) -> Value {
        Value::Ascii(vec![s.as_bytes().to_vec()])
    }

    fn naive(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_strip_offset_keeps_wall_clock() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let dt = tokyo.with_ymd_and_hms(2025, 9, 13, 17, 5, 0).unwrap();
        assert_eq!(strip_offset(dt), naive("2025-09-13 17:05:00"));

        let utc = FixedOffset::east_opt(0).unwrap();
        let same_instant = dt.with_timezone(&utc);
        assert_eq!(strip_offset(same_instant), naive("2025-09-13 08:05:00"));
    }

    #[test]
    fn test_prefers_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        File::create(&path).unwrap();

        let mut c = TagContainer::empty();
        c.set(TagGroup::Exif, DATE_TIME_ORIGINAL, ascii("2025:09:13 17:05:00"));
        c.set(TagGroup::Primary, DATE_TIME, ascii("2025:10:01 09:00:00"));

        let t = capture_timestamp(&c, &path);
        assert_eq!(t.source, TimeSource::Original);
        assert_eq!(t.timestamp, naive("2025-09-13 17:05:00"));
    }

    #[test]
    fn test_falls_back_to_modified_when_original_unparsable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        File::create(&path).unwrap();

        let mut c = TagContainer::empty();
        c.set(TagGroup::Exif, DATE_TIME_ORIGINAL, ascii("not a date"));
        c.set(TagGroup::Primary, DATE_TIME, ascii("2025:10:01 09:00:00"));

        let t = capture_timestamp(&c, &path);
        assert_eq!(t.source, TimeSource::Modified);
        assert_eq!(t.timestamp, naive("2025-10-01 09:00:00"));
    }

    #[test]
    fn test_falls_back_to_file_mtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        File::create(&path).unwrap();

        let mtime = naive("2024-05-06 07:08:09")
            .and_local_timezone(Local)
            .single()
            .unwrap();
        filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(mtime.timestamp(), 0))
            .unwrap();

        let t = capture_timestamp(&TagContainer::empty(), &path);
        assert_eq!(t.source, TimeSource::FileModified);
        assert_eq!(t.timestamp, naive("2024-05-06 07:08:09"));
    }

    #[test]
    fn test_unreadable_file_uses_epoch() {
        let dir = tempdir().unwrap();
        let t = capture_timestamp(&TagContainer::empty(), &dir.path().join("gone.jpg"));
        assert_eq!(t.source, TimeSource::Unknown);
        assert_eq!(t.timestamp, naive("1970-01-01 00:00:00"));
    }
}
