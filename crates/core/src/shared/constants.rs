use std::time::Duration;

/// Side length of the square face crop handed to the feature extractor.
pub const FACE_CROP_SIZE: u32 = 160;

/// Run face detection on every Nth frame to bound per-frame CPU cost.
pub const DEFAULT_DETECT_INTERVAL: usize = 3;

/// Capacity of the recognition job and result queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// A track with no update for this long is removed.
pub const TRACK_TTL: Duration = Duration::from_secs(3);

/// Max center-to-center distance (px) for a detection to refresh an
/// existing track instead of opening a new one.
pub const DEFAULT_PROXIMITY_PX: i32 = 60;

/// How long the recognition worker waits on an empty job queue before
/// re-checking its running flag.
pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(100);
