use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::error::PhotoError;
use crate::media::PhotoRecord;
use crate::metadata::Coordinate;

/// What happens to one photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// No timeline position exists; copy the bytes through.
    CopyNoCoordinate,
    /// GPS is already present and overwriting is off; copy the bytes through.
    CopyKeepGps,
    /// Write the coordinate into the photo's GPS tags.
    Embed(Coordinate),
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::CopyNoCoordinate => "copied (no timeline data)",
            Action::CopyKeepGps => "copied (kept existing GPS)",
            Action::Embed(_) => "geotagged",
        }
    }
}

/// Decide the action for a photo.
pub fn decide(record: &PhotoRecord, overwrite: bool) -> Action {
    match record.coordinate {
        None => Action::CopyNoCoordinate,
        Some(_) if record.has_existing_gps && !overwrite => Action::CopyKeepGps,
        Some(coordinate) => Action::Embed(coordinate),
    }
}

/// Path of `source_path` relative to `source_root`.
pub fn relative_path(source_root: &Path, source_path: &Path) -> Result<PathBuf, PhotoError> {
    let outside = || PhotoError::OutsideSourceRoot(source_path.to_path_buf());
    let rel = pathdiff::diff_paths(source_path, source_root).ok_or_else(outside)?;
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || rel.as_os_str().is_empty() {
        return Err(outside());
    }
    Ok(rel)
}

/// Mirror a source-relative path under the destination root.
pub fn destination_path(destination_root: &Path, relative: &Path) -> PathBuf {
    destination_root.join(relative)
}

/// Hands out destinations, refusing any path handed out before.
#[derive(Debug, Default)]
pub struct DestinationClaims {
    claimed: HashSet<PathBuf>,
}

impl DestinationClaims {
    pub fn claim(&mut self, dest: &Path) -> Result<(), PhotoError> {
        if self.claimed.insert(dest.to_path_buf()) {
            Ok(())
        } else {
            Err(PhotoError::PathConflict(dest.to_path_buf()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn record(coordinate: Option<Coordinate>, has_existing_gps: bool) -> PhotoRecord {
        PhotoRecord {
            source_path: PathBuf::from("/photos/a.jpg"),
            relative_path: PathBuf::from("a.jpg"),
            capture_timestamp: NaiveDateTime::default(),
            has_existing_gps,
            coordinate,
        }
    }

    const HERE: Coordinate = Coordinate {
        latitude: 35.0,
        longitude: 139.0,
    };

    #[test]
    fn test_decide() {
        assert_eq!(decide(&record(None, false), false), Action::CopyNoCoordinate);
        assert_eq!(decide(&record(None, true), true), Action::CopyNoCoordinate);
        assert_eq!(decide(&record(Some(HERE), true), false), Action::CopyKeepGps);
        assert_eq!(decide(&record(Some(HERE), true), true), Action::Embed(HERE));
        assert_eq!(decide(&record(Some(HERE), false), false), Action::Embed(HERE));
    }

    #[test]
    fn test_destination_mirrors_subdirectories() {
        let rel = relative_path(Path::new("root"), Path::new("root/2025/A.jpg")).unwrap();
        assert_eq!(rel, PathBuf::from("2025/A.jpg"));
        assert_eq!(
            destination_path(Path::new("out"), &rel),
            PathBuf::from("out/2025/A.jpg")
        );

        let rel = relative_path(Path::new("/data/src"), Path::new("/data/src/B.jpg")).unwrap();
        assert_eq!(destination_path(Path::new("/data/out"), &rel), PathBuf::from("/data/out/B.jpg"));
    }

    #[test]
    fn test_relative_path_outside_root() {
        assert!(matches!(
            relative_path(Path::new("/data/src"), Path::new("/data/other/B.jpg")),
            Err(PhotoError::OutsideSourceRoot(_))
        ));
        assert!(relative_path(Path::new("/data/src"), Path::new("/data/src")).is_err());
    }

    #[test]
    fn test_claims_detect_conflict() {
        let mut claims = DestinationClaims::default();
        assert!(claims.claim(Path::new("out/a.jpg")).is_ok());
        assert!(claims.claim(Path::new("out/b.jpg")).is_ok());
        assert!(matches!(
            claims.claim(Path::new("out/a.jpg")),
            Err(PhotoError::PathConflict(_))
        ));
    }
}
