use std::path::Path;

use crate::shared::frame::Frame;

/// Shape of the stream a capture source yields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Nominal frames per second; 0.0 when the source has no timing.
    pub fps: f64,
}

/// Yields a sequence of raw video frames.
///
/// End of stream is signaled by the iterator ending; a failed read
/// surfaces as an `Err` item and ends the run. Implementations handle
/// I/O details (camera, file, frame directory).
pub trait CaptureSource: Send {
    /// Opens the source and returns its stream shape.
    fn open(&mut self, path: &Path) -> Result<StreamInfo, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
