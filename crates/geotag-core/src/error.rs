use std::path::PathBuf;

/// Why a single photo could not be written to the destination.
///
/// None of these abort the batch; they are counted and reported in
/// [`crate::ProcessResult::failures`].
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode EXIF block: {0}")]
    Encode(#[from] exif::Error),

    #[error("not a writable JPEG container: {0}")]
    Container(String),

    #[error("{} is not under the source folder", .0.display())]
    OutsideSourceRoot(PathBuf),

    #[error("destination {} is already claimed by another photo", .0.display())]
    PathConflict(PathBuf),
}
