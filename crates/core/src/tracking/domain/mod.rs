pub mod track;
pub mod track_manager;
