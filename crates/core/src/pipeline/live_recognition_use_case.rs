use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::face_detector::FaceDetector;
use crate::gallery::domain::decision_policy::DecisionPolicy;
use crate::gallery::domain::gallery_index::GalleryIndex;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::domain::feature_extractor::FeatureExtractor;
use crate::recognition::infrastructure::recognition_worker::RecognitionWorker;
use crate::shared::constants::{DEFAULT_DETECT_INTERVAL, DEFAULT_QUEUE_CAPACITY};
use crate::tracking::domain::track_manager::{TrackManager, TrackManagerConfig};
use crate::video::domain::capture_source::CaptureSource;
use crate::video::domain::display_sink::DisplaySink;

/// Configuration for one recognition run.
pub struct LiveRecognitionConfig {
    /// Run face detection on every Nth frame.
    pub detect_interval: usize,
    /// Capacity of the job and result queues.
    pub queue_capacity: usize,
    pub tracks: TrackManagerConfig,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for LiveRecognitionConfig {
    fn default() -> Self {
        Self {
            detect_interval: DEFAULT_DETECT_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            tracks: TrackManagerConfig::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Orchestrates the live recognition pipeline.
///
/// The capture loop stays single-threaded and synchronous per frame:
/// detect (every Nth frame), reconcile tracks, drain whatever results the
/// worker has published, sweep expired tracks, present. Matching latency
/// lives entirely on the worker thread; the only blocking this loop does
/// is frame I/O itself. Single-use: `execute` consumes the components.
pub struct LiveRecognitionUseCase {
    source: Option<Box<dyn CaptureSource>>,
    detector: Option<Box<dyn FaceDetector>>,
    extractor: Option<Box<dyn FeatureExtractor>>,
    index: Arc<GalleryIndex>,
    policy: DecisionPolicy,
    sink: Option<Box<dyn DisplaySink>>,
    logger: Box<dyn PipelineLogger>,
    config: LiveRecognitionConfig,
}

impl LiveRecognitionUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn CaptureSource>,
        detector: Box<dyn FaceDetector>,
        extractor: Box<dyn FeatureExtractor>,
        index: Arc<GalleryIndex>,
        policy: DecisionPolicy,
        sink: Box<dyn DisplaySink>,
        logger: Box<dyn PipelineLogger>,
        config: LiveRecognitionConfig,
    ) -> Self {
        Self {
            source: Some(source),
            detector: Some(detector),
            extractor: Some(extractor),
            index,
            policy,
            sink: Some(sink),
            logger,
            config,
        }
    }

    pub fn execute(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut source = self.source.take().ok_or("Pipeline already executed")?;
        let mut detector = self.detector.take().ok_or("Pipeline already executed")?;
        let extractor = self.extractor.take().ok_or("Pipeline already executed")?;
        let mut sink = self.sink.take().ok_or("Pipeline already executed")?;

        let (job_tx, job_rx) = crossbeam_channel::bounded(self.config.queue_capacity);
        let (res_tx, res_rx) = crossbeam_channel::bounded(self.config.queue_capacity);

        let worker = RecognitionWorker::spawn(
            extractor,
            self.index.clone(),
            self.policy,
            job_rx,
            res_tx,
        );
        let mut manager = TrackManager::new(job_tx, res_rx, self.config.tracks);

        let run_result = run_capture_loop(
            source.as_mut(),
            detector.as_mut(),
            &mut manager,
            sink.as_mut(),
            self.logger.as_mut(),
            &self.config,
        );

        worker.stop();
        source.close();

        let stats = manager.stats();
        self.logger.info(&format!(
            "tracks created: {}, jobs enqueued: {}, dropped: {}, results applied: {}, stale: {}",
            stats.tracks_created,
            stats.jobs_enqueued,
            stats.jobs_dropped,
            stats.results_applied,
            stats.results_stale
        ));
        self.logger.summary();

        run_result
    }
}

fn run_capture_loop(
    source: &mut dyn CaptureSource,
    detector: &mut dyn FaceDetector,
    manager: &mut TrackManager,
    sink: &mut dyn DisplaySink,
    logger: &mut dyn PipelineLogger,
    config: &LiveRecognitionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let detect_interval = config.detect_interval.max(1);

    for frame_result in source.frames() {
        if config.cancelled.load(Ordering::Relaxed) {
            logger.info("cancelled, stopping capture loop");
            break;
        }
        let frame = frame_result?;
        let now = Instant::now();

        if frame.index() % detect_interval == 0 {
            let started = Instant::now();
            let regions = detector.detect(&frame)?;
            logger.timing("detect", started.elapsed().as_secs_f64() * 1000.0);
            manager.observe(&frame, &regions, now);
        }

        manager.drain_results(now);
        manager.sweep_expired(now);

        sink.present(&frame, manager.tracks())?;

        logger.frame(frame.index());
        logger.metric("queue_depth", manager.queue_depth() as f64);
        logger.metric("active_tracks", manager.tracks().len() as f64);
    }

    Ok(())
}
