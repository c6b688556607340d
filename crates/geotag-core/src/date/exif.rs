use chrono::NaiveDateTime;

use crate::metadata::{TagContainer, TagGroup, DATE_TIME, DATE_TIME_ORIGINAL};

/// EXIF date-times carry no zone: they are the camera's wall clock as-is.
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// `DateTimeOriginal` from the Exif IFD, if present and well-formed.
pub fn original_capture_time(container: &TagContainer) -> Option<NaiveDateTime> {
    container
        .ascii(TagGroup::Exif, DATE_TIME_ORIGINAL)
        .and_then(parse_exif_datetime)
}

/// `DateTime` (last modification) from the primary IFD.
pub fn modification_time(container: &TagContainer) -> Option<NaiveDateTime> {
    container
        .ascii(TagGroup::Primary, DATE_TIME)
        .and_then(parse_exif_datetime)
}

/// Parse `YYYY:MM:DD HH:MM:SS`. Trailing NULs and spaces some cameras pad
/// with are ignored; any other deviation is rejected.
pub fn parse_exif_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    let s = std::str::from_utf8(raw).ok()?;
    let s = s.trim_end_matches(|c: char| c == '\0' || c == ' ');
    NaiveDateTime::parse_from_str(s, EXIF_DATETIME_FORMAT).ok()
}
