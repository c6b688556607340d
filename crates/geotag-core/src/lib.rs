pub mod cancel;
pub mod date;
pub mod error;
pub mod media;
pub mod metadata;
pub mod policy;
pub mod scan;
pub mod timeline;
pub mod writer;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use cancel::{CancellationToken, CancelledError};
pub use error::PhotoError;
pub use metadata::{Coordinate, GeoDegrees, TagContainer, TagGroup, Thumbnail};
pub use policy::Action;
pub use timeline::{TimelineIndex, TimelineSample};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Location-history JSON export
    pub timeline: PathBuf,
    /// Folder scanned recursively for photos
    pub source: PathBuf,
    /// Folder receiving the mirrored tree
    pub destination: PathBuf,
    /// Replace GPS tags a photo already has
    #[serde(default)]
    pub overwrite: bool,
    /// Worker threads; rayon's default when unset
    #[serde(default)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub stage: String,
    pub current: u64,
    pub total: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResult {
    pub timeline_samples: u64,
    pub total_photos: u64,
    /// Photos written with new GPS tags
    pub geotagged: u64,
    /// Photos copied through unchanged
    pub copied: u64,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

impl ProcessResult {
    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }
}

/// Control options for process execution (cancellation, progress).
#[derive(Debug, Clone, Default)]
pub struct ProcessControl {
    pub cancel_token: Option<CancellationToken>,
    /// Receives progress events. Sends never block and a dropped receiver
    /// is ignored.
    pub progress: Option<Sender<Progress>>,
}

impl ProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn with_progress(mut self, sender: Sender<Progress>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn check(&self) -> Result<(), CancelledError> {
        match &self.cancel_token {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

/// Throttled progress reporter: emits at most every 200ms, plus the final
/// event of each stage. Never waits: if another worker holds the throttle,
/// the event is dropped.
pub struct ThrottledProgress<'a> {
    sender: Option<&'a Sender<Progress>>,
    last_emit: Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    const INTERVAL: Duration = Duration::from_millis(200);

    pub fn new(sender: Option<&'a Sender<Progress>>) -> Self {
        let start = Instant::now()
            .checked_sub(Self::INTERVAL)
            .unwrap_or_else(Instant::now);
        Self {
            sender,
            last_emit: Mutex::new(start),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let Some(sender) = self.sender else {
            return;
        };
        let is_done = current >= total;
        if !is_done {
            let Ok(mut last) = self.last_emit.try_lock() else {
                return;
            };
            if last.elapsed() < Self::INTERVAL {
                return;
            }
            *last = Instant::now();
        }
        let _ = sender.send(Progress {
            stage: stage.to_string(),
            current,
            total,
            message: message.to_string(),
        });
    }
}

/// Run the full pipeline: load the timeline, discover photos, write them.
pub fn process(options: &ProcessOptions) -> anyhow::Result<ProcessResult> {
    process_with_control(options, &ProcessControl::default())
}

/// Run the full pipeline with cancellation and progress reporting.
///
/// A timeline path that does not exist is the only error besides
/// cancellation; an unreadable timeline degrades to plain copies.
pub fn process_with_control(
    options: &ProcessOptions,
    control: &ProcessControl,
) -> anyhow::Result<ProcessResult> {
    let tp = ThrottledProgress::new(control.progress.as_ref());
    control.check()?;

    if !options.timeline.exists() {
        anyhow::bail!("timeline file {} does not exist", options.timeline.display());
    }

    let index = timeline::TimelineIndex::load(&options.timeline);
    let samples = index.len() as u64;
    tp.report("timeline", samples, samples, "Timeline loaded");
    if index.is_empty() {
        tracing::warn!("timeline has no usable samples; photos will be copied unchanged");
    }

    let photos = scan::find_photos(&options.source);
    let found = photos.len() as u64;
    tp.report("scan", found, found, "Photos found");
    tracing::info!(photos = found, source = %options.source.display(), "scanned source folder");

    control.check()?;
    process_photos(options, &index, &photos, control)
}

/// Process an already discovered list of photos against a built index.
pub fn process_photos(
    options: &ProcessOptions,
    index: &TimelineIndex,
    photos: &[PathBuf],
    control: &ProcessControl,
) -> anyhow::Result<ProcessResult> {
    let tp = ThrottledProgress::new(control.progress.as_ref());
    let mut result = ProcessResult {
        timeline_samples: index.len() as u64,
        total_photos: photos.len() as u64,
        ..Default::default()
    };

    let (planned, rejected) = writer::plan(&options.source, &options.destination, photos);
    for (path, error) in rejected {
        record_failure(&mut result, &path, &error);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.unwrap_or(0))
        .build()?;

    let total = planned.len() as u64;
    let counter = AtomicU64::new(0);

    let outcomes: Vec<Option<Result<Action, PhotoError>>> = pool.install(|| {
        planned
            .par_iter()
            .map(|photo| {
                // Checked between photos only, never mid-write.
                if control.check().is_err() {
                    return None;
                }
                let outcome = writer::process_photo(photo, index, options.overwrite);
                let current = counter.fetch_add(1, Ordering::Relaxed) + 1;
                tp.report("photos", current, total, &photo.relative_path.to_string_lossy());
                Some(outcome)
            })
            .collect()
    });

    let mut cancelled = false;
    for (photo, outcome) in planned.iter().zip(outcomes) {
        match outcome {
            Some(Ok(Action::Embed(_))) => result.geotagged += 1,
            Some(Ok(_)) => result.copied += 1,
            Some(Err(error)) => record_failure(&mut result, &photo.source_path, &error),
            None => cancelled = true,
        }
    }
    if cancelled {
        return Err(CancelledError.into());
    }

    tracing::info!(
        total = result.total_photos,
        geotagged = result.geotagged,
        copied = result.copied,
        failed = result.failed(),
        "finished"
    );
    Ok(result)
}

fn record_failure(result: &mut ProcessResult, path: &Path, error: &PhotoError) {
    tracing::warn!(photo = %path.display(), "not processed: {error}");
    result.failures.push(Failure {
        path: path.to_path_buf(),
        error: error.to_string(),
    });
}
