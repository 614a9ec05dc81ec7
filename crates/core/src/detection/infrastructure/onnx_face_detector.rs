/// YOLO-style face detector using ONNX Runtime via `ort`.
///
/// Letterbox preprocessing, inference, confidence filtering, greedy NMS,
/// and mapping boxes back to frame coordinates. Track association is not
/// done here; that is the track manager's job.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Fallback model input resolution when the model doesn't specify one.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detections.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

pub struct OnnxFaceDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceDetector {
    /// Load a YOLO-style ONNX face model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape
    /// (expecting NCHW); falls back to 640 when dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();

        // Output is [1, num_features, num_detections] (transposed) or
        // [1, num_detections, num_features]. Handle both.
        let (num_dets, num_feats) = match shape {
            [_, a, b] if a < b => (*b, *a),
            [_, a, b] => (*a, *b),
            other => return Err(format!("unexpected model output shape: {other:?}").into()),
        };
        let transposed = shape[1] < shape[2];
        let data = tensor.as_slice().ok_or("cannot get output tensor slice")?;

        let mut boxes = Vec::new();
        for i in 0..num_dets {
            let at = |f: usize| {
                if transposed {
                    data[f * num_dets + i]
                } else {
                    data[i * num_feats + f]
                }
            };
            if num_feats < 5 {
                continue;
            }
            let conf = at(4) as f64;
            if conf < self.confidence {
                continue;
            }

            let cx = at(0) as f64;
            let cy = at(1) as f64;
            let w = at(2) as f64;
            let h = at(3) as f64;

            // From letterbox coordinates back to frame coordinates.
            boxes.push(RawBox {
                x1: ((cx - w / 2.0) - pad_x as f64) / scale,
                y1: ((cy - h / 2.0) - pad_y as f64) / scale,
                x2: ((cx + w / 2.0) - pad_x as f64) / scale,
                y2: ((cy + h / 2.0) - pad_y as f64) / scale,
                confidence: conf,
            });
        }

        let kept = nms(&mut boxes, NMS_IOU_THRESH);
        Ok(kept
            .iter()
            .map(|b| {
                Region::new(
                    b.x1.round() as i32,
                    b.y1.round() as i32,
                    (b.x2 - b.x1).round() as i32,
                    (b.y2 - b.y1).round() as i32,
                )
                .clamped(frame.width(), frame.height())
            })
            .collect())
    }
}

/// Letterbox-resize a frame to `target_size` x `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // 114/255 gray padding, YOLO convention.
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

#[derive(Clone, Debug)]
struct RawBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(boxes: &mut [RawBox], iou_thresh: f64) -> Vec<RawBox> {
    boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for i in 0..boxes.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(boxes[i].clone());
        for j in (i + 1)..boxes.len() {
            if !suppressed[j] && box_iou(&boxes[i], &boxes[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn box_iou(a: &RawBox, b: &RawBox) -> f64 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_box(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> RawBox {
        RawBox {
            x1,
            y1,
            x2,
            y2,
            confidence,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 frame -> scale 3.2, new size 640x320, vertical padding.
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, scale, pad_x, pad_y) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert!((scale - 3.2).abs() < 0.01);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, 160);
    }

    #[test]
    fn test_letterbox_pad_value_and_normalization() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, _, pad_x, pad_y) = letterbox(&frame, 640);

        assert_eq!(pad_x, 0);
        assert!(pad_y > 0);
        // Image pixel ~1.0, pad pixel ~114/255.
        assert!((tensor[[0, 0, pad_y as usize + 1, 1]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 0, 0, 0]] - 114.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_nms_suppresses_overlapping_keeps_strongest() {
        let mut boxes = vec![
            raw_box(0.0, 0.0, 100.0, 100.0, 0.6),
            raw_box(5.0, 5.0, 105.0, 105.0, 0.9),
        ];
        let kept = nms(&mut boxes, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_keeps_disjoint_boxes() {
        let mut boxes = vec![
            raw_box(0.0, 0.0, 50.0, 50.0, 0.9),
            raw_box(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        assert_eq!(nms(&mut boxes, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_empty() {
        let mut boxes: Vec<RawBox> = Vec::new();
        assert!(nms(&mut boxes, 0.3).is_empty());
    }

    #[test]
    fn test_box_iou_identity_and_disjoint() {
        let a = raw_box(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = raw_box(20.0, 20.0, 30.0, 30.0, 1.0);
        assert!((box_iou(&a, &a) - 1.0).abs() < 1e-9);
        assert_eq!(box_iou(&a, &b), 0.0);
    }
}
