pub mod annotated_image_sink;
pub mod image_dir_source;
