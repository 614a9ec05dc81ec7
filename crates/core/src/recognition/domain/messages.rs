use crate::gallery::domain::decision_policy::Verdict;
use crate::shared::frame::Frame;

/// One face crop queued for recognition. Created by the track manager,
/// consumed exactly once by the recognition worker.
#[derive(Clone, Debug)]
pub struct RecognitionJob {
    pub crop: Frame,
    pub track_id: u64,
    pub frame_index: usize,
}

/// Verdict for one processed job. Jobs that fail extraction produce no
/// result; the track ages out or is re-queued by a later detection.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionResult {
    pub track_id: u64,
    pub verdict: Verdict,
    pub frame_index: usize,
}
