use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::capture_source::{CaptureSource, StreamInfo};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Adapts a directory of image files to the [`CaptureSource`] interface.
///
/// Files are played back in lexicographic order, so zero-padded frame
/// numbers (`frame_000042.png`) keep their capture order. Every image is
/// decoded to RGB; the stream shape is taken from the first image and
/// later frames are expected to match it.
pub struct ImageDirSource {
    files: Vec<PathBuf>,
    info: Option<StreamInfo>,
}

impl ImageDirSource {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            info: None,
        }
    }
}

impl Default for ImageDirSource {
    fn default() -> Self {
        Self::new()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl CaptureSource for ImageDirSource {
    fn open(&mut self, path: &Path) -> Result<StreamInfo, Box<dyn std::error::Error>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_image(p))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(format!("no image frames found in {}", path.display()).into());
        }

        let first = image::open(&files[0])?;
        let info = StreamInfo {
            width: first.width(),
            height: first.height(),
            fps: 0.0,
        };
        self.files = files;
        self.info = Some(info);
        Ok(info)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let files = std::mem::take(&mut self.files);
        Box::new(files.into_iter().enumerate().map(|(index, path)| {
            let img = image::open(&path)?.to_rgb8();
            let (w, h) = img.dimensions();
            Ok(Frame::new(img.into_raw(), w, h, 3, index))
        }))
    }

    fn close(&mut self) {
        self.files.clear();
        self.info = None;
    }
}
