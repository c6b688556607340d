use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions picked up by discovery. Matched exactly, so `.Jpg` is skipped.
pub const PHOTO_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "JPG", "JPEG"];

/// Recursively find photos under `root`, sorted by path.
///
/// Unreadable directories are logged and skipped.
pub fn find_photos(root: &Path) -> Vec<PathBuf> {
    let mut photos: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_photo(e.path()))
        .map(|e| e.into_path())
        .collect();
    photos.sort();
    photos
}

pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PHOTO_EXTENSIONS.contains(&e))
}
