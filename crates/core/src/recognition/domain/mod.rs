pub mod feature_extractor;
pub mod messages;
