use std::fs;
use std::path::PathBuf;

use crate::gallery::domain::gallery_index::RawGallery;
use crate::gallery::domain::gallery_store::GalleryStore;

/// Directory-backed gallery store: one JSON float-array file per captured
/// enrollment sample.
///
/// The identity key is the file stem up to the first `_`, so
/// `s1023_1.json` and `s1023_2.json` both enroll under `s1023`. Files
/// that fail to read or parse are logged and skipped; the store only
/// errors when the directory itself is unreadable.
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl GalleryStore for JsonDirStore {
    fn load(&self) -> Result<RawGallery, Box<dyn std::error::Error>> {
        let mut raw = RawGallery::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let identity = stem.split('_').next().unwrap_or(stem).to_string();

            let sample: Vec<f32> = match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()))
            {
                Ok(sample) => sample,
                Err(e) => {
                    log::warn!("skipping gallery sample {}: {e}", path.display());
                    continue;
                }
            };

            raw.entry(identity).or_default().push(sample);
        }

        log::info!(
            "loaded {} identities from {}",
            raw.len(),
            self.dir.display()
        );
        Ok(raw)
    }
}
