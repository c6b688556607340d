//! Location-history documents as exported by Google Maps Timeline.
//!
//! Every field is optional: real exports mix segment kinds (visits,
//! activities, paths) and only some of them carry usable points.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::date::strip_offset;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDocument {
    #[serde(default)]
    pub semantic_segments: Vec<SemanticSegment>,
    #[serde(default)]
    pub raw_signals: Vec<RawSignal>,
    /// Legacy `Records.json` layout.
    #[serde(default)]
    pub locations: Vec<LegacyRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticSegment {
    #[serde(default)]
    pub timeline_path: Vec<PathPoint>,
}

#[derive(Debug, Deserialize)]
pub struct PathPoint {
    pub point: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawSignal {
    pub position: Option<RawPosition>,
}

#[derive(Debug, Deserialize)]
pub struct RawPosition {
    #[serde(rename = "LatLng")]
    pub lat_lng: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyRecord {
    #[serde(rename = "latitudeE7")]
    pub latitude_e7: Option<i64>,
    #[serde(rename = "longitudeE7")]
    pub longitude_e7: Option<i64>,
    pub timestamp: Option<String>,
}

impl TimelineDocument {
    /// Flatten every entry that carries both a position and a time into
    /// `(wall-clock time, latitude, longitude)`. Malformed entries are skipped.
    pub fn entries(&self) -> impl Iterator<Item = (NaiveDateTime, f64, f64)> + '_ {
        let paths = self
            .semantic_segments
            .iter()
            .flat_map(|s| s.timeline_path.iter())
            .filter_map(|p| parse_entry(p.point.as_deref()?, p.time.as_deref()?));

        let signals = self
            .raw_signals
            .iter()
            .filter_map(|s| s.position.as_ref())
            .filter_map(|p| parse_entry(p.lat_lng.as_deref()?, p.timestamp.as_deref()?));

        let legacy = self.locations.iter().filter_map(|r| {
            let lat = r.latitude_e7? as f64 / 1e7;
            let lon = r.longitude_e7? as f64 / 1e7;
            let time = parse_timestamp(r.timestamp.as_deref()?)?;
            valid_coordinate(lat, lon).then_some((time, lat, lon))
        });

        paths.chain(signals).chain(legacy)
    }
}

fn parse_entry(point: &str, time: &str) -> Option<(NaiveDateTime, f64, f64)> {
    let Some((lat, lon)) = parse_point(point) else {
        tracing::trace!(point, "dropping timeline entry with malformed point");
        return None;
    };
    let Some(time) = parse_timestamp(time) else {
        tracing::trace!(time, "dropping timeline entry with malformed time");
        return None;
    };
    Some((time, lat, lon))
}

/// Parse `"35.6978689°, 139.7731628°"` into `(lat, lon)`.
///
/// Accepts an optional `geo:` prefix and ignores any trailing degree-sign-like
/// characters after each number.
pub fn parse_point(s: &str) -> Option<(f64, f64)> {
    let s = s.trim();
    let s = s.strip_prefix("geo:").unwrap_or(s);
    let mut parts = s.split(',');
    let lat = parse_degrees(parts.next()?)?;
    let lon = parse_degrees(parts.next()?)?;
    valid_coordinate(lat, lon).then_some((lat, lon))
}

fn parse_degrees(s: &str) -> Option<f64> {
    s.trim()
        .trim_end_matches(|c: char| !(c.is_ascii_digit() || c == '.'))
        .parse()
        .ok()
}

fn valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
}

/// Parse an ISO-8601 timestamp, with or without a UTC offset, into the
/// wall-clock reading it describes. Offsets are stripped, not applied.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(strip_offset(dt));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(s, fmt) {
            return Some(strip_offset(dt));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(
            parse_point("35.6978689°, 139.7731628°"),
            Some((35.6978689, 139.7731628))
        );
        assert_eq!(parse_point("-33.8568, 151.2153"), Some((-33.8568, 151.2153)));
        assert_eq!(parse_point("geo:48.8584,2.2945"), Some((48.8584, 2.2945)));
        // Mis-decoded degree sign
        assert_eq!(parse_point("35.5째, 139.5째"), Some((35.5, 139.5)));
    }

    #[test]
    fn test_parse_point_malformed() {
        assert_eq!(parse_point(""), None);
        assert_eq!(parse_point("35.1"), None);
        assert_eq!(parse_point("north, east"), None);
        assert_eq!(parse_point("95.0, 10.0"), None);
        assert_eq!(parse_point("10.0, 181.0"), None);
    }

    #[test]
    fn test_parse_timestamp_strips_offset() {
        let expected = naive("2025-09-13 17:05:00");
        assert_eq!(parse_timestamp("2025-09-13T17:05:00+09:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-09-13T17:05:00.000+09:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-09-13T17:05:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-09-13T17:05:00-04:00"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_naive_forms() {
        assert_eq!(
            parse_timestamp("2025-09-13T17:05:00"),
            Some(naive("2025-09-13 17:05:00"))
        );
        assert_eq!(
            parse_timestamp("2025-09-13 17:05:00.250"),
            Some(naive("2025-09-13 17:05:00") + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse_timestamp("2025-09-13"), Some(naive("2025-09-13 00:00:00")));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2025-13-01T00:00:00"), None);
    }

    #[test]
    fn test_entries_all_formats() {
        let doc: TimelineDocument = serde_json::from_str(
            r#"{
                "semanticSegments": [
                    {"startTime": "2025-09-13T16:00:00+09:00"},
                    {"timelinePath": [
                        {"point": "35.0°, 139.0°", "time": "2025-09-13T17:00:00+09:00"},
                        {"point": "35.1°, 139.1°"},
                        {"time": "2025-09-13T17:02:00+09:00"},
                        {"point": "bogus", "time": "2025-09-13T17:03:00+09:00"}
                    ]}
                ],
                "rawSignals": [
                    {"position": {"LatLng": "36.0°, 140.0°", "timestamp": "2025-09-14T08:00:00.000+09:00"}},
                    {"wifiScan": {}}
                ],
                "locations": [
                    {"latitudeE7": 375000000, "longitudeE7": -1220000000, "timestamp": "2020-01-01T00:00:00Z"},
                    {"latitudeE7": 375000000, "timestamp": "2020-01-01T00:00:00Z"}
                ]
            }"#,
        )
        .unwrap();

        let entries: Vec<_> = doc.entries().collect();
        assert_eq!(
            entries,
            vec![
                (naive("2025-09-13 17:00:00"), 35.0, 139.0),
                (naive("2025-09-14 08:00:00"), 36.0, 140.0),
                (naive("2020-01-01 00:00:00"), 37.5, -122.0),
            ]
        );
    }
}
