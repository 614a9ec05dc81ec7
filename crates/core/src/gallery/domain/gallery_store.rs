use crate::gallery::domain::gallery_index::RawGallery;

/// Source of enrolled embeddings, loaded once at startup.
///
/// Implementations own the storage format (files, database, ...); the
/// index only sees identity keys and raw sample vectors.
pub trait GalleryStore {
    fn load(&self) -> Result<RawGallery, Box<dyn std::error::Error>>;
}
