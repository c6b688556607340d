use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::date;
use crate::error::PhotoError;
use crate::media::PhotoRecord;
use crate::metadata::{jpeg, TagContainer};
use crate::policy::{self, Action, DestinationClaims};
use crate::timeline::TimelineIndex;

/// A photo with its destination already assigned.
#[derive(Debug, Clone)]
pub struct PlannedPhoto {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub destination: PathBuf,
}

/// Assign destination paths (sequential, needs conflict tracking).
///
/// Photos that cannot be placed are returned separately with the reason.
pub fn plan(
    source_root: &Path,
    destination_root: &Path,
    photos: &[PathBuf],
) -> (Vec<PlannedPhoto>, Vec<(PathBuf, PhotoError)>) {
    let mut claims = DestinationClaims::default();
    let mut planned = Vec::with_capacity(photos.len());
    let mut rejected = Vec::new();

    for source_path in photos {
        let placed = policy::relative_path(source_root, source_path).and_then(|relative_path| {
            let destination = policy::destination_path(destination_root, &relative_path);
            claims.claim(&destination)?;
            Ok(PlannedPhoto {
                source_path: source_path.clone(),
                relative_path,
                destination,
            })
        });
        match placed {
            Ok(p) => planned.push(p),
            Err(e) => rejected.push((source_path.clone(), e)),
        }
    }

    (planned, rejected)
}

/// Read one photo, decide what to do with it and write the destination file.
pub fn process_photo(
    photo: &PlannedPhoto,
    index: &TimelineIndex,
    overwrite: bool,
) -> Result<Action, PhotoError> {
    let bytes = fs::read(&photo.source_path)?;
    let mut container = TagContainer::read(&bytes);
    let captured = date::capture_timestamp(&container, &photo.source_path);

    let record = PhotoRecord {
        source_path: photo.source_path.clone(),
        relative_path: photo.relative_path.clone(),
        capture_timestamp: captured.timestamp,
        has_existing_gps: container.has_gps(),
        coordinate: index.nearest(captured.timestamp).map(|s| s.coordinate()),
    };
    let action = policy::decide(&record, overwrite);

    tracing::debug!(
        photo = %record.relative_path.display(),
        captured = %record.capture_timestamp,
        source = ?captured.source,
        existing_gps = ?container.gps_coordinate(),
        "{}",
        action.label()
    );

    match action {
        Action::Embed(coordinate) => {
            container.set_coordinate(coordinate);
            let out = jpeg::embed(bytes, &container)?;
            write_atomic(&photo.source_path, &photo.destination, &out)?;
        }
        Action::CopyNoCoordinate | Action::CopyKeepGps => {
            write_atomic(&photo.source_path, &photo.destination, &bytes)?;
        }
    }

    Ok(action)
}

/// Write `contents` to `dest` through a temp file in the same directory, so a
/// destination file is either complete or absent. Permissions and mtime are
/// taken from `source`.
fn write_atomic(source: &Path, dest: &Path, contents: &[u8]) -> Result<(), PhotoError> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    let meta = fs::metadata(source)?;
    fs::set_permissions(tmp.path(), meta.permissions())?;
    let mtime = filetime::FileTime::from_last_modification_time(&meta);
    filetime::set_file_mtime(tmp.path(), mtime)?;

    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
