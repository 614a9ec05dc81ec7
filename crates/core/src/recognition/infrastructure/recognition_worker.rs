use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::gallery::domain::decision_policy::DecisionPolicy;
use crate::gallery::domain::embedding::l2_normalize;
use crate::gallery::domain::gallery_index::GalleryIndex;
use crate::recognition::domain::feature_extractor::{ExtractionError, FeatureExtractor};
use crate::recognition::domain::messages::{RecognitionJob, RecognitionResult};
use crate::shared::constants::WORKER_POLL_INTERVAL;

/// The single background consumer of the recognition job queue.
///
/// Pulls jobs with a bounded wait (no busy-spin on an empty queue),
/// extracts an embedding, queries the gallery, applies the decision
/// policy, and publishes a result. Being the only consumer, it publishes
/// results in job submission order; the track manager relies on that FIFO
/// guarantee and never reorders by frame number.
pub struct RecognitionWorker {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl RecognitionWorker {
    pub fn spawn(
        extractor: Box<dyn FeatureExtractor>,
        index: Arc<GalleryIndex>,
        policy: DecisionPolicy,
        jobs: Receiver<RecognitionJob>,
        results: Sender<RecognitionResult>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = std::thread::spawn(move || {
            run_loop(extractor, &index, policy, &jobs, &results, &flag);
        });
        Self {
            handle: Some(handle),
            running,
        }
    }

    /// Signals the loop to exit and joins the thread.
    ///
    /// No result is published after this returns; jobs still queued are
    /// discarded unprocessed.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("recognition worker thread panicked");
            }
        }
    }
}

impl Drop for RecognitionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(
    mut extractor: Box<dyn FeatureExtractor>,
    index: &GalleryIndex,
    policy: DecisionPolicy,
    jobs: &Receiver<RecognitionJob>,
    results: &Sender<RecognitionResult>,
    running: &AtomicBool,
) {
    while running.load(Ordering::Relaxed) {
        let job = match jobs.recv_timeout(WORKER_POLL_INTERVAL) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let track_id = job.track_id;
        let frame_index = job.frame_index;
        match process_job(extractor.as_mut(), index, policy, job) {
            Ok(result) => {
                // Shutdown may have begun while this job was in flight;
                // nothing is published after the flag clears.
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                // Never block on a full result queue: the capture loop
                // may already be gone, and a blocked send here would
                // hang the shutdown join. Dropping the verdict mirrors
                // the drop-on-full job policy; the track ages out.
                match results.try_send(result) {
                    Ok(()) => {}
                    Err(TrySendError::Full(result)) => {
                        log::warn!(
                            "result queue full, dropping verdict for track {}",
                            result.track_id
                        );
                    }
                    // Receiver gone means the pipeline is shutting down.
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Err(e) => {
                // The job is dropped without a result; the track ages out
                // or gets re-queued on a later detection.
                log::warn!("recognition failed for track {track_id} (frame {frame_index}): {e}");
            }
        }
    }
}

/// Runs one job end to end. A panic anywhere inside (a bad crop, a model
/// bug) is caught and reported as an extraction failure so a single bad
/// job can never take the worker loop down.
fn process_job(
    extractor: &mut dyn FeatureExtractor,
    index: &GalleryIndex,
    policy: DecisionPolicy,
    job: RecognitionJob,
) -> Result<RecognitionResult, ExtractionError> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut embedding = extractor.extract(&job.crop)?;
        l2_normalize(&mut embedding);
        let nearest = index.query(&embedding);
        Ok(policy.decide(nearest.as_ref()))
    }));

    let verdict = match outcome {
        Ok(result) => result?,
        Err(_) => return Err(ExtractionError::Panicked),
    };

    log::debug!(
        "track {} (frame {}): {:?}",
        job.track_id,
        job.frame_index,
        verdict
    );
    Ok(RecognitionResult {
        track_id: job.track_id,
        verdict,
        frame_index: job.frame_index,
    })
}
