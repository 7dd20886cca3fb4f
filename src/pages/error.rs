//! Page rendering error types

use thiserror::Error;

/// Errors raised while loading or rendering pages
#[derive(Debug, Error)]
pub enum PageError {
    /// An embedded template could not be found or read
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Template parsing or rendering error
    #[error("Template error: {0}")]
    TemplateError(String),

    /// The generated image could not be encoded for the page
    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),
}
