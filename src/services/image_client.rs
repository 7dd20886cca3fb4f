//! Image generation client
//!
//! Talks to an OpenAI-compatible `images/generations` endpoint:
//! 1. POST the prompt and size at the standard quality tier, asking for one image
//! 2. Read the URL of the generated asset from the response
//! 3. GET the asset bytes
//! 4. Decode them with the `image` crate
//!
//! Every call makes exactly one attempt. Any failure along the chain comes
//! back as a [`GenerationError`]; nothing panics.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;

use crate::config::ProviderConfig;
use crate::models::{GeneratedImage, ImageSize, ImagesRequest, ImagesResponse, ProviderErrorBody};

/// Images requested per call
const IMAGES_PER_REQUEST: u32 = 1;

/// Quality tier sent with every request
const QUALITY: &str = "standard";

/// Error types for image generation
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// No API key was configured
    #[error("PROVIDER_API_KEY is not configured")]
    MissingApiKey,

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Provider answered with a non-success status
    #[error("Provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Transport failure talking to the provider
    #[error("Request to provider failed: {0}")]
    Request(String),

    /// Success status but a body we could not read
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Response carried no image reference
    #[error("Provider returned no image")]
    NoImage,

    /// Fetching the generated asset failed
    #[error("Failed to download generated image: {0}")]
    Download(String),

    /// Asset bytes are not a decodable image
    #[error("Downloaded data is not a valid image: {0}")]
    Decode(String),
}

/// Something that turns a prompt into an image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<GeneratedImage, GenerationError>;
}

/// HTTP client for the image provider
#[derive(Clone)]
pub struct ImageClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for ImageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ImageClient {
    /// Build a client from provider settings.
    ///
    /// Fails with [`GenerationError::MissingApiKey`] when no key is set.
    pub fn new(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(GenerationError::MissingApiKey)?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GenerationError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/images/generations", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the provider for one image and return the URL it points to
    async fn request_image_url(&self, prompt: &str, size: ImageSize) -> Result<String, GenerationError> {
        let body = ImagesRequest {
            model: &self.model,
            prompt,
            size,
            quality: QUALITY,
            n: IMAGES_PER_REQUEST,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = provider_error_message(&text, status);
            tracing::warn!("Provider rejected generation request: {} {}", status, message);
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ImagesResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let first = parsed.data.into_iter().next().ok_or(GenerationError::NoImage)?;
        if let Some(revised) = first.revised_prompt.as_deref() {
            tracing::debug!("Provider revised prompt ({} chars)", revised.chars().count());
        }
        first.url.ok_or(GenerationError::NoImage)
    }

    /// Fetch the asset bytes. No credentials are sent to the asset host.
    async fn download(&self, url: &str) -> Result<Vec<u8>, GenerationError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GenerationError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Download(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<GeneratedImage, GenerationError> {
        let started = Instant::now();
        tracing::info!(
            "Generating image: model={} size={} prompt_chars={}",
            self.model,
            size,
            prompt.chars().count()
        );

        let url = self.request_image_url(prompt, size).await?;
        let bytes = self.download(&url).await?;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| GenerationError::Decode(e.to_string()))?;

        tracing::info!(
            "Image generated: {}x{} in {}ms",
            image.width(),
            image.height(),
            started.elapsed().as_millis()
        );
        Ok(GeneratedImage::new(image, size))
    }
}

/// Pull a human-readable message out of an error body.
///
/// Uses `error.message` from the standard envelope, else the raw body, else
/// the status text.
fn provider_error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ProviderErrorBody>(body) {
        return parsed.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
