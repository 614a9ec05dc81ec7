pub mod capture_source;
pub mod display_sink;
