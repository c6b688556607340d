use chrono::NaiveDateTime;

use super::{TimelineIndex, TimelineSample};

impl TimelineIndex {
    /// Find the sample closest in time to `query`.
    ///
    /// Returns `None` only for an empty index. There is no distance cutoff: a
    /// sample days away is still returned if it is the closest one. When the
    /// query sits exactly halfway between two samples the earlier one wins.
    pub fn nearest(&self, query: NaiveDateTime) -> Option<&TimelineSample> {
        let samples = self.samples();
        // First sample with timestamp >= query.
        let idx = samples.partition_point(|s| s.timestamp < query);

        let after = samples.get(idx);
        let before = idx.checked_sub(1).and_then(|i| samples.get(i));

        match (before, after) {
            (Some(b), Some(a)) => {
                if a.timestamp - query < query - b.timestamp {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (Some(b), None) => Some(b),
            (None, a) => a,
        }
    }
}
