//! Data models
//!
//! This module contains the data structures shared by the services and the
//! web layer:
//! - Per-session state
//! - Image sizes and decoded images
//! - Provider request/response wire types

mod image;
mod session;

pub use self::image::{
    GeneratedImage, ImageData, ImageSize, ImagesRequest, ImagesResponse, ProviderErrorBody,
    ProviderErrorDetail, DOWNLOAD_FILE_NAME,
};
pub use session::SessionState;
