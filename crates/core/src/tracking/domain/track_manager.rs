use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::recognition::domain::messages::{RecognitionJob, RecognitionResult};
use crate::shared::constants::{DEFAULT_PROXIMITY_PX, FACE_CROP_SIZE, TRACK_TTL};
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::tracking::domain::track::{Track, TrackStatus};

#[derive(Clone, Copy, Debug)]
pub struct TrackManagerConfig {
    /// Max time a track may go without an update before removal.
    pub ttl: Duration,
    /// Max center distance (px) for a detection to refresh a live track.
    pub proximity: i32,
    /// Side length of the square crop submitted for recognition.
    pub crop_size: u32,
}

impl Default for TrackManagerConfig {
    fn default() -> Self {
        Self {
            ttl: TRACK_TTL,
            proximity: DEFAULT_PROXIMITY_PX,
            crop_size: FACE_CROP_SIZE,
        }
    }
}

/// Running counters for pipeline observability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackStats {
    pub tracks_created: u64,
    pub jobs_enqueued: u64,
    /// Jobs dropped because the queue was full (track left `Pending`).
    pub jobs_dropped: u64,
    pub results_applied: u64,
    /// Results whose track had already expired (discarded, not an error).
    pub results_stale: u64,
}

/// Owns all face-track state and drives its lifecycle.
///
/// Lives on the capture/detection thread; the only things crossing the
/// thread boundary are job and result messages, so no track state needs
/// locking. The manager never blocks: jobs go out with `try_send` (a full
/// queue leaves the track `Pending` for this pass) and results come in
/// with `try_recv`.
pub struct TrackManager {
    tracks: Vec<Track>,
    next_id: u64,
    jobs: Sender<RecognitionJob>,
    results: Receiver<RecognitionResult>,
    config: TrackManagerConfig,
    stats: TrackStats,
}

impl TrackManager {
    pub fn new(
        jobs: Sender<RecognitionJob>,
        results: Receiver<RecognitionResult>,
        config: TrackManagerConfig,
    ) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 0,
            jobs,
            results,
            config,
            stats: TrackStats::default(),
        }
    }

    /// Reconciles one detection pass with the live track set.
    ///
    /// A detection whose center lands within the proximity tolerance of a
    /// live track refreshes that track's box and timestamp; a `Pending`
    /// track additionally retries its enqueue. Anything else becomes a
    /// new track. Note the deliberate limitation: there is no motion or
    /// appearance linking, so a face that moves farther than the
    /// tolerance between passes gets a fresh track id.
    pub fn observe(&mut self, frame: &Frame, regions: &[Region], now: Instant) {
        for region in regions {
            // A detection clamped down to nothing carries no pixels to
            // recognize; don't open a track for it.
            if region.width <= 0 || region.height <= 0 {
                continue;
            }
            match self.find_near(region) {
                Some(i) => {
                    self.tracks[i].refresh_region(*region, now);
                    if self.tracks[i].status == TrackStatus::Pending {
                        let crop = frame.crop_resized(region, self.config.crop_size);
                        if self.try_enqueue(self.tracks[i].id, crop, frame.index()) {
                            self.tracks[i].status = TrackStatus::Recognizing;
                        }
                    }
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.stats.tracks_created += 1;

                    let crop = frame.crop_resized(region, self.config.crop_size);
                    let status = if self.try_enqueue(id, crop, frame.index()) {
                        TrackStatus::Recognizing
                    } else {
                        TrackStatus::Pending
                    };
                    self.tracks.push(Track::new(id, *region, status, now));
                }
            }
        }
    }

    /// Drains every result currently available, without blocking.
    ///
    /// A result for a track that has since expired is discarded; late
    /// arrival is expected under TTL eviction, not an error.
    pub fn drain_results(&mut self, now: Instant) {
        while let Ok(result) = self.results.try_recv() {
            match self.tracks.iter_mut().find(|t| t.id == result.track_id) {
                Some(track) => {
                    track.apply_verdict(&result.verdict, now);
                    self.stats.results_applied += 1;
                    log::debug!(
                        "track {}: '{}' at distance {:.4} (from frame {})",
                        track.id,
                        track.label(),
                        result.verdict.distance(),
                        result.frame_index
                    );
                }
                None => {
                    self.stats.results_stale += 1;
                    log::debug!(
                        "discarding result for expired track {}",
                        result.track_id
                    );
                }
            }
        }
    }

    /// Removes tracks whose last update is older than the TTL.
    pub fn sweep_expired(&mut self, now: Instant) {
        let ttl = self.config.ttl;
        self.tracks.retain(|t| !t.is_expired(now, ttl));
    }

    /// Current annotated state, for rendering.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn stats(&self) -> TrackStats {
        self.stats
    }

    /// Depth of the outbound job queue, for observability.
    pub fn queue_depth(&self) -> usize {
        self.jobs.len()
    }

    fn find_near(&self, region: &Region) -> Option<usize> {
        self.tracks
            .iter()
            .position(|t| t.region.is_near(region, self.config.proximity))
    }

    fn try_enqueue(&mut self, track_id: u64, crop: Frame, frame_index: usize) -> bool {
        let job = RecognitionJob {
            crop,
            track_id,
            frame_index,
        };
        match self.jobs.try_send(job) {
            Ok(()) => {
                self.stats.jobs_enqueued += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                self.stats.jobs_dropped += 1;
                log::warn!("recognition queue full, track {track_id} left pending");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.stats.jobs_dropped += 1;
                log::warn!("recognition queue disconnected, track {track_id} left pending");
                false
            }
        }
    }
}
