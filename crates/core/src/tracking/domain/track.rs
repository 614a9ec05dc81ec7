use std::time::{Duration, Instant};

use crate::gallery::domain::decision_policy::Verdict;
use crate::shared::region::Region;

/// Recognition lifecycle of a face track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStatus {
    /// Created, but its recognition job could not be queued yet.
    Pending,
    /// Job enqueued, result not yet received.
    Recognizing,
    /// Matched an enrolled identity.
    Identified,
    /// Processed but rejected by the decision policy.
    Unknown,
}

/// A short-lived, run-scoped record linking a detected face region to its
/// evolving recognition status.
///
/// Ids are monotonically increasing and unique per run. A track whose
/// timestamp is not refreshed (by a new result or a re-detection of its
/// region) within the TTL is removed; there is no persistence.
#[derive(Clone, Debug)]
pub struct Track {
    pub id: u64,
    pub region: Region,
    pub status: TrackStatus,
    pub identity: Option<String>,
    pub distance: Option<f64>,
    pub created_at: Instant,
    pub updated_at: Instant,
}

impl Track {
    pub fn new(id: u64, region: Region, status: TrackStatus, now: Instant) -> Self {
        Self {
            id,
            region,
            status,
            identity: None,
            distance: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a recognition verdict and refreshes the timestamp.
    pub fn apply_verdict(&mut self, verdict: &Verdict, now: Instant) {
        match verdict {
            Verdict::Match { identity, distance } => {
                self.status = TrackStatus::Identified;
                self.identity = Some(identity.clone());
                self.distance = Some(*distance);
            }
            Verdict::Unknown { distance } => {
                self.status = TrackStatus::Unknown;
                self.identity = None;
                self.distance = Some(*distance);
            }
        }
        self.updated_at = now;
    }

    /// Refreshes the bounding box after a re-detection of this face.
    pub fn refresh_region(&mut self, region: Region, now: Instant) {
        self.region = region;
        self.updated_at = now;
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.updated_at) > ttl
    }

    /// Display label: the matched identity, or "Unknown" for any track
    /// the policy rejected.
    pub fn label(&self) -> &str {
        self.identity.as_deref().unwrap_or("Unknown")
    }
}
