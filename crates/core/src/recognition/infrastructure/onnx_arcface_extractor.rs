/// ArcFace embedding extractor using ONNX Runtime.
///
/// Produces the L2-normalized 512-dim vectors the gallery is enrolled
/// with. Runs on the recognition worker thread only, so the session needs
/// no locking.
use std::path::Path;

use crate::gallery::domain::embedding::l2_normalize;
use crate::recognition::domain::feature_extractor::{ExtractionError, FeatureExtractor};
use crate::shared::frame::Frame;

pub const EMBEDDING_DIM: usize = 512;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceExtractor {
    session: ort::session::Session,
}

impl OnnxArcFaceExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;
        Ok(Self { session })
    }
}

impl FeatureExtractor for OnnxArcFaceExtractor {
    fn extract(&mut self, crop: &Frame) -> Result<Vec<f32>, ExtractionError> {
        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)
            .map_err(|e| ExtractionError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| ExtractionError::Inference(e.to_string()))?;
        let embedding_array = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| ExtractionError::Inference(e.to_string()))?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or_else(|| ExtractionError::Inference("cannot get embedding slice".into()))?;

        if embedding_slice.len() != EMBEDDING_DIM {
            return Err(ExtractionError::Dimension {
                got: embedding_slice.len(),
                expected: EMBEDDING_DIM,
            });
        }

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Resize the crop to 112x112, apply `(x - 127.5) / 127.5`, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;
    let ch = crop.channels() as usize;
    let data = crop.data();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * ch;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_crop(value: u8) -> Frame {
        Frame::new(vec![value; 160 * 160 * 3], 160, 160, 3, 0)
    }

    #[test]
    fn test_preprocess_shape() {
        let tensor = preprocess(&solid_crop(128));
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_normalization_range() {
        let max = preprocess(&solid_crop(255));
        let min = preprocess(&solid_crop(0));
        assert!((max[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
        assert!((min[[0, 0, 0, 0]] + 1.0).abs() < 0.01);
    }

    #[test]
    fn test_preprocess_midpoint_maps_near_zero() {
        let tensor = preprocess(&solid_crop(127));
        assert!(tensor[[0, 0, 56, 56]].abs() < 0.01);
    }

    #[test]
    fn test_preprocess_accepts_non_square_input() {
        let crop = Frame::new(vec![10u8; 80 * 40 * 3], 80, 40, 3, 0);
        let tensor = preprocess(&crop);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }
}
