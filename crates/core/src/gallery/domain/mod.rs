pub mod decision_policy;
pub mod embedding;
pub mod gallery_index;
pub mod gallery_store;
