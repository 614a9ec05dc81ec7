pub mod onnx_arcface_extractor;
pub mod recognition_worker;
