//! Custom Axum extractors.
//!
//! Extractors for parsing and validating request data. Rejections are
//! turned into [`crate::error::ApiError`] so every malformed request gets
//! the same JSON error body.

pub mod params;
pub mod validated_json;

pub use params::{ApiPath, ApiQuery};
pub use validated_json::ValidatedJson;
