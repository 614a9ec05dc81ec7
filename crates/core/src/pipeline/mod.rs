pub mod live_recognition_use_case;
pub mod pipeline_logger;
