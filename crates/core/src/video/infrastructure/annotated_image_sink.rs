use std::path::PathBuf;

use crate::shared::frame::Frame;
use crate::tracking::domain::track::{Track, TrackStatus};
use crate::video::domain::display_sink::DisplaySink;

/// Status colors: gray for pending (seen but unprocessed), yellow while
/// recognizing, green for an identified face, red for a rejected one.
fn status_color(status: TrackStatus) -> [u8; 3] {
    match status {
        TrackStatus::Pending => [100, 100, 100],
        TrackStatus::Recognizing => [255, 255, 0],
        TrackStatus::Identified => [0, 255, 0],
        TrackStatus::Unknown => [255, 0, 0],
    }
}

/// Writes each cycle as a numbered PNG with status-colored track boxes.
///
/// Labels and distances go to the log rather than the image; this sink
/// exists for inspecting pipeline behavior offline, not for UI.
pub struct AnnotatedImageSink {
    out_dir: PathBuf,
}

impl AnnotatedImageSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl DisplaySink for AnnotatedImageSink {
    fn present(
        &mut self,
        frame: &Frame,
        tracks: &[Track],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut annotated = frame.clone();
        for track in tracks {
            draw_rect(&mut annotated, track, status_color(track.status));
            if let Some(distance) = track.distance {
                log::info!(
                    "frame {}: track {} -> {} ({distance:.3})",
                    frame.index(),
                    track.id,
                    track.label()
                );
            }
        }

        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("frame_{:06}.png", frame.index()));
        image::save_buffer(
            &path,
            annotated.data(),
            annotated.width(),
            annotated.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(())
    }
}

fn draw_rect(frame: &mut Frame, track: &Track, color: [u8; 3]) {
    let clamped = track.region.clamped(frame.width(), frame.height());
    if clamped.width == 0 || clamped.height == 0 {
        return;
    }
    let stride = frame.width() as usize * 3;
    let (x1, y1) = (clamped.x as usize, clamped.y as usize);
    let (x2, y2) = (
        (clamped.x + clamped.width - 1) as usize,
        (clamped.y + clamped.height - 1) as usize,
    );
    let data = frame.data_mut();

    let mut put = |x: usize, y: usize| {
        let off = y * stride + x * 3;
        data[off..off + 3].copy_from_slice(&color);
    };
    for x in x1..=x2 {
        put(x, y1);
        put(x, y2);
    }
    for y in y1..=y2 {
        put(x1, y);
        put(x2, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::Region;
    use std::time::Instant;

    fn track(status: TrackStatus, region: Region) -> Track {
        Track::new(1, region, status, Instant::now())
    }

    #[test]
    fn test_draw_rect_outlines_box() {
        let mut frame = Frame::new(vec![0u8; 20 * 20 * 3], 20, 20, 3, 0);
        let t = track(TrackStatus::Identified, Region::new(5, 5, 10, 10));
        draw_rect(&mut frame, &t, [0, 255, 0]);

        let px = |x: usize, y: usize| {
            let off = (y * 20 + x) * 3;
            [frame.data()[off], frame.data()[off + 1], frame.data()[off + 2]]
        };
        // Corners and edges painted, interior untouched.
        assert_eq!(px(5, 5), [0, 255, 0]);
        assert_eq!(px(14, 14), [0, 255, 0]);
        assert_eq!(px(10, 5), [0, 255, 0]);
        assert_eq!(px(10, 10), [0, 0, 0]);
    }

    #[test]
    fn test_draw_rect_skips_degenerate_region() {
        let mut frame = Frame::new(vec![0u8; 10 * 10 * 3], 10, 10, 3, 0);
        let t = track(TrackStatus::Pending, Region::new(50, 50, 5, 5));
        draw_rect(&mut frame, &t, [255, 0, 0]);
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_present_writes_numbered_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = AnnotatedImageSink::new(dir.path());
        let frame = Frame::new(vec![0u8; 16 * 16 * 3], 16, 16, 3, 42);
        sink.present(&frame, &[track(TrackStatus::Recognizing, Region::new(2, 2, 6, 6))])
            .unwrap();
        assert!(dir.path().join("frame_000042.png").exists());
    }

    #[test]
    fn test_status_colors_are_distinct() {
        let all = [
            TrackStatus::Pending,
            TrackStatus::Recognizing,
            TrackStatus::Identified,
            TrackStatus::Unknown,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(status_color(*a), status_color(*b));
            }
        }
    }
}
