use crate::shared::frame::Frame;
use crate::tracking::domain::track::Track;

/// Consumes one annotated cycle: the current frame plus the live track
/// state (boxes, labels, distances).
///
/// Rendering is outside the pipeline's correctness contract; a sink may
/// draw, write files, or do nothing at all.
pub trait DisplaySink {
    fn present(&mut self, frame: &Frame, tracks: &[Track])
        -> Result<(), Box<dyn std::error::Error>>;
}

/// Sink that discards every frame. Used in tests and headless runs.
pub struct NullDisplaySink;

impl DisplaySink for NullDisplaySink {
    fn present(
        &mut self,
        _frame: &Frame,
        _tracks: &[Track],
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
