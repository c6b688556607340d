pub mod json;
pub mod nearest;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::metadata::Coordinate;

/// One location fix from the timeline, on the naive wall-clock scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSample {
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
}

impl TimelineSample {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Timeline samples sorted ascending by timestamp. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    samples: Vec<TimelineSample>,
}

impl TimelineIndex {
    /// Build an index from samples in any order.
    pub fn from_samples(mut samples: Vec<TimelineSample>) -> Self {
        // Stable, so equal timestamps keep their source order.
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    /// Load a timeline document from disk.
    ///
    /// Never fails: a missing, unreadable or structurally invalid document
    /// yields an empty index, which callers treat as "no coordinates".
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(index) => {
                tracing::info!(
                    samples = index.len(),
                    path = %path.display(),
                    "loaded timeline"
                );
                index
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "could not load timeline: {e:#}");
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> anyhow::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let doc: json::TimelineDocument = serde_json::from_reader(reader)?;
        Ok(Self::from_document(&doc))
    }

    pub fn from_document(doc: &json::TimelineDocument) -> Self {
        let samples = doc
            .entries()
            .map(|(timestamp, latitude, longitude)| TimelineSample {
                timestamp,
                latitude,
                longitude,
            })
            .collect();
        Self::from_samples(samples)
    }

    pub fn samples(&self) -> &[TimelineSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
