use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use facewatch_core::detection::domain::face_detector::FaceDetector;
use facewatch_core::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use facewatch_core::gallery::domain::decision_policy::DecisionPolicy;
use facewatch_core::gallery::domain::gallery_index::GalleryIndex;
use facewatch_core::gallery::domain::gallery_store::GalleryStore;
use facewatch_core::gallery::infrastructure::json_dir_store::JsonDirStore;
use facewatch_core::pipeline::live_recognition_use_case::{
    LiveRecognitionConfig, LiveRecognitionUseCase,
};
use facewatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facewatch_core::recognition::infrastructure::onnx_arcface_extractor::OnnxArcFaceExtractor;
use facewatch_core::tracking::domain::track_manager::TrackManagerConfig;
use facewatch_core::video::domain::capture_source::CaptureSource;
use facewatch_core::video::domain::display_sink::{DisplaySink, NullDisplaySink};
use facewatch_core::video::infrastructure::annotated_image_sink::AnnotatedImageSink;
use facewatch_core::video::infrastructure::image_dir_source::ImageDirSource;

/// Live face recognition over a directory of captured frames.
#[derive(Parser)]
#[command(name = "facewatch")]
struct Cli {
    /// Directory of input frames (played in lexicographic order).
    input: PathBuf,

    /// Directory of enrolled gallery samples (one JSON array per sample,
    /// identity taken from the file stem before the first '_').
    #[arg(long)]
    gallery: PathBuf,

    /// YOLO-style face detection ONNX model.
    #[arg(long)]
    detector_model: PathBuf,

    /// ArcFace embedding ONNX model.
    #[arg(long)]
    embedder_model: PathBuf,

    /// Write annotated frames to this directory (omit for a headless run).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Max cosine distance for an accepted match.
    #[arg(long, default_value = "0.2")]
    absolute_threshold: f64,

    /// Required distance gap to the runner-up identity.
    #[arg(long, default_value = "0.05")]
    relative_gap: f64,

    /// Run detection every Nth frame (1 = every frame).
    #[arg(long, default_value = "3")]
    detect_interval: usize,

    /// Capacity of the recognition job queue.
    #[arg(long, default_value = "8")]
    queue_capacity: usize,

    /// Seconds a track survives without an update.
    #[arg(long, default_value = "3.0")]
    track_ttl: f64,

    /// Max center distance in pixels to treat a detection as the same track.
    #[arg(long, default_value = "60")]
    proximity: i32,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let store = JsonDirStore::new(&cli.gallery);
    let index = Arc::new(GalleryIndex::from_raw(store.load()?)?);
    log::info!("gallery ready: {} identities", index.len());

    let detector: Box<dyn FaceDetector> =
        Box::new(OnnxFaceDetector::new(&cli.detector_model, cli.confidence)?);
    let extractor = Box::new(OnnxArcFaceExtractor::new(&cli.embedder_model)?);

    let mut source = Box::new(ImageDirSource::new());
    let info = source.open(&cli.input)?;
    log::info!(
        "capture source: {}x{} frames from {}",
        info.width,
        info.height,
        cli.input.display()
    );

    let sink: Box<dyn DisplaySink> = match &cli.out {
        Some(dir) => Box::new(AnnotatedImageSink::new(dir)),
        None => Box::new(NullDisplaySink),
    };

    let policy = DecisionPolicy {
        absolute_threshold: cli.absolute_threshold,
        relative_gap: cli.relative_gap,
    };
    let config = LiveRecognitionConfig {
        detect_interval: cli.detect_interval,
        queue_capacity: cli.queue_capacity,
        tracks: TrackManagerConfig {
            ttl: Duration::from_secs_f64(cli.track_ttl),
            proximity: cli.proximity,
            ..TrackManagerConfig::default()
        },
        ..LiveRecognitionConfig::default()
    };

    LiveRecognitionUseCase::new(
        source,
        detector,
        extractor,
        index,
        policy,
        sink,
        Box::new(StdoutPipelineLogger::default()),
        config,
    )
    .execute()
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_dir() {
        return Err(format!("Input directory not found: {}", cli.input.display()).into());
    }
    if !cli.gallery.is_dir() {
        return Err(format!("Gallery directory not found: {}", cli.gallery.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(0.0..=2.0).contains(&cli.absolute_threshold) {
        return Err(format!(
            "Absolute threshold must be between 0.0 and 2.0, got {}",
            cli.absolute_threshold
        )
        .into());
    }
    if cli.relative_gap < 0.0 {
        return Err(format!("Relative gap must be non-negative, got {}", cli.relative_gap).into());
    }
    if cli.detect_interval == 0 {
        return Err("Detect interval must be at least 1".into());
    }
    if cli.queue_capacity == 0 {
        return Err("Queue capacity must be at least 1".into());
    }
    if cli.track_ttl <= 0.0 {
        return Err(format!("Track TTL must be positive, got {}", cli.track_ttl).into());
    }
    Ok(())
}
