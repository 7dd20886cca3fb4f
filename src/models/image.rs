//! Image model
//!
//! Defines the three supported output sizes, the decoded image handed to the
//! presentation layer, and the provider's `images/generations` wire types.

use data_encoding::BASE64;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// File name offered for every download
pub const DOWNLOAD_FILE_NAME: &str = "generated_image.png";

/// Output dimensions accepted by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSize {
    /// 1024x1024
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    /// 1792x1024
    #[serde(rename = "1792x1024")]
    Landscape,
    /// 1024x1792
    #[serde(rename = "1024x1792")]
    Portrait,
}

impl ImageSize {
    /// All sizes, in the order the form lists them
    pub const ALL: [ImageSize; 3] = [ImageSize::Square, ImageSize::Landscape, ImageSize::Portrait];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1792x1024",
            ImageSize::Portrait => "1024x1792",
        }
    }

    /// (width, height) in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSize::Square => (1024, 1024),
            ImageSize::Landscape => (1792, 1024),
            ImageSize::Portrait => (1024, 1792),
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1024x1024" => Ok(ImageSize::Square),
            "1792x1024" => Ok(ImageSize::Landscape),
            "1024x1792" => Ok(ImageSize::Portrait),
            _ => Err(anyhow::anyhow!("Invalid image size: {}", s)),
        }
    }
}

/// A decoded image returned by the provider.
///
/// Lives only for the request that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    image: DynamicImage,
    requested_size: ImageSize,
}

impl GeneratedImage {
    pub fn new(image: DynamicImage, requested_size: ImageSize) -> Self {
        Self {
            image,
            requested_size,
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn requested_size(&self) -> ImageSize {
        self.requested_size
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as PNG for download
    pub fn to_png(&self) -> image::ImageResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.image.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// PNG bytes as a `data:` URI, usable both as `<img src>` and as a
    /// download link target
    pub fn to_data_uri(&self) -> image::ImageResult<String> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
    }
}

/// Body of `POST {base_url}/images/generations`
#[derive(Debug, Serialize)]
pub struct ImagesRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub size: ImageSize,
    pub quality: &'a str,
    pub n: u32,
}

/// Successful `images/generations` response
#[derive(Debug, Deserialize)]
pub struct ImagesResponse {
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

/// Standard provider error envelope: `{"error": {"message": ...}}`
#[derive(Debug, Deserialize)]
pub struct ProviderErrorBody {
    pub error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ProviderErrorDetail {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
