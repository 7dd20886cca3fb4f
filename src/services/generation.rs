//! Generation pipeline
//!
//! Runs one user-triggered generation against one session:
//! authentication → configuration → prompt → cooldown → provider call.
//! The session's last-generation time moves only after a confirmed success.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::{GeneratedImage, ImageSize, SessionState};
use crate::services::image_client::{GenerationError, ImageGenerator};
use crate::services::prompt::normalize;
use crate::services::rate_limiter::{RateDecision, RateGate};

/// Why a generation did not produce an image
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Session has not passed the credential gate
    #[error("Please enter the application password first")]
    Unauthenticated,

    /// Generation is disabled by missing configuration
    #[error("{0}")]
    NotConfigured(String),

    /// Nothing left after trimming
    #[error("Please enter a prompt first!")]
    EmptyPrompt,

    /// Cooldown has not elapsed
    #[error("Please wait {wait_seconds} seconds before generating another image")]
    RateLimited {
        remaining: Duration,
        wait_seconds: u64,
    },

    /// The provider call chain failed
    #[error("Error generating image: {0}")]
    Generation(#[source] GenerationError),
}

impl PipelineError {
    /// Warnings are user input problems; everything else is an error
    pub fn is_warning(&self) -> bool {
        matches!(self, PipelineError::EmptyPrompt | PipelineError::RateLimited { .. })
    }
}

/// Orchestrates the gates and the image generator
pub struct GenerationService {
    generator: Option<Arc<dyn ImageGenerator>>,
    rate_gate: RateGate,
}

impl GenerationService {
    /// `generator` is `None` when no provider key is configured; every
    /// attempt then fails with [`PipelineError::NotConfigured`].
    pub fn new(generator: Option<Arc<dyn ImageGenerator>>, cooldown: Duration) -> Self {
        Self {
            generator,
            rate_gate: RateGate::new(cooldown),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub fn cooldown(&self) -> Duration {
        self.rate_gate.cooldown()
    }

    /// Generate one image for `session`.
    pub async fn generate(
        &self,
        session: &mut SessionState,
        raw_prompt: &str,
        size: ImageSize,
    ) -> Result<GeneratedImage, PipelineError> {
        if !session.authenticated {
            return Err(PipelineError::Unauthenticated);
        }

        let generator = self.generator.as_ref().ok_or_else(|| {
            PipelineError::NotConfigured(GenerationError::MissingApiKey.to_string())
        })?;

        let prompt = normalize(raw_prompt);
        if prompt.is_empty() {
            return Err(PipelineError::EmptyPrompt);
        }

        let decision = self.rate_gate.check(Instant::now(), session.last_generation);
        if let RateDecision::Wait(remaining) = decision {
            tracing::info!("Generation throttled, {}s remaining", decision.wait_seconds());
            return Err(PipelineError::RateLimited {
                remaining,
                wait_seconds: decision.wait_seconds(),
            });
        }

        match generator.generate(&prompt, size).await {
            Ok(image) => {
                session.last_generation = Some(Instant::now());
                Ok(image)
            }
            Err(e) => {
                tracing::error!("Image generation failed: {}", e);
                Err(PipelineError::Generation(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::sync::Mutex;

    /// Records prompts and answers with a tiny image or a fixed error
    struct StubGenerator {
        prompts: Mutex<Vec<(String, ImageSize)>>,
        fail_with: Option<String>,
    }

    impl StubGenerator {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                fail_with: None,
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageGenerator for StubGenerator {
        async fn generate(
            &self,
            prompt: &str,
            size: ImageSize,
        ) -> Result<GeneratedImage, GenerationError> {
            self.prompts.lock().unwrap().push((prompt.to_string(), size));
            match &self.fail_with {
                Some(message) => Err(GenerationError::Rejected {
                    status: 400,
                    message: message.clone(),
                }),
                None => {
                    let buffer = ImageBuffer::from_pixel(4, 4, Rgb([0u8, 0, 0]));
                    Ok(GeneratedImage::new(DynamicImage::ImageRgb8(buffer), size))
                }
            }
        }
    }

    fn service(stub: &Arc<StubGenerator>) -> GenerationService {
        let generator: Arc<dyn ImageGenerator> = stub.clone();
        GenerationService::new(Some(generator), Duration::from_secs(10))
    }

    fn authenticated() -> SessionState {
        SessionState {
            authenticated: true,
            last_generation: None,
        }
    }

    #[tokio::test]
    async fn test_success_records_timestamp() {
        let stub = StubGenerator::ok();
        let service = service(&stub);
        let mut session = authenticated();

        let image = service
            .generate(&mut session, "  a red fox  ", ImageSize::Landscape)
            .await
            .unwrap();

        assert_eq!(image.requested_size(), ImageSize::Landscape);
        assert!(session.last_generation.is_some());
        assert_eq!(
            stub.prompts.lock().unwrap()[0],
            ("a red fox".to_string(), ImageSize::Landscape)
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_never_calls_provider() {
        let stub = StubGenerator::ok();
        let service = service(&stub);
        let mut session = SessionState::new();

        let err = service
            .generate(&mut session, "a red fox", ImageSize::Square)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Unauthenticated));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_provider_is_configuration_error() {
        let service = GenerationService::new(None, Duration::from_secs(10));
        let mut session = authenticated();

        let err = service
            .generate(&mut session, "a red fox", ImageSize::Square)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NotConfigured(_)));
        assert!(err.to_string().contains("PROVIDER_API_KEY"));
        assert!(!service.is_configured());
    }

    #[tokio::test]
    async fn test_blank_prompt_never_calls_provider() {
        let stub = StubGenerator::ok();
        let service = service(&stub);
        let mut session = authenticated();

        for blank in ["", "   ", "\n\t "] {
            let err = service
                .generate(&mut session, blank, ImageSize::Square)
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::EmptyPrompt));
            assert!(err.is_warning());
        }
        assert_eq!(stub.calls(), 0);
        assert!(session.last_generation.is_none());
    }

    #[tokio::test]
    async fn test_second_generation_inside_cooldown_is_throttled() {
        let stub = StubGenerator::ok();
        let service = service(&stub);
        let mut session = authenticated();

        service
            .generate(&mut session, "a red fox", ImageSize::Square)
            .await
            .unwrap();
        let err = service
            .generate(&mut session, "a blue fox", ImageSize::Square)
            .await
            .unwrap_err();

        match err {
            PipelineError::RateLimited { remaining, wait_seconds } => {
                assert!(remaining > Duration::from_secs(9));
                assert_eq!(wait_seconds, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_five_seconds_after_last_reports_five_second_wait() {
        let stub = StubGenerator::ok();
        let service = service(&stub);
        let mut session = authenticated();
        session.last_generation = Instant::now().checked_sub(Duration::from_secs(5));

        let err = service
            .generate(&mut session, "a red fox", ImageSize::Square)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Please wait 5 seconds before generating another image"
        );
        match err {
            PipelineError::RateLimited { wait_seconds, .. } => assert_eq!(wait_seconds, 5),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_after_cooldown_generation_is_allowed() {
        let stub = StubGenerator::ok();
        let service = service(&stub);
        let mut session = authenticated();
        session.last_generation = Instant::now().checked_sub(Duration::from_secs(11));

        assert!(service
            .generate(&mut session, "a red fox", ImageSize::Square)
            .await
            .is_ok());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_timestamp_unchanged() {
        let stub = StubGenerator::failing("Billing hard limit has been reached");
        let service = service(&stub);
        let mut session = authenticated();
        let earlier = Instant::now().checked_sub(Duration::from_secs(60));
        session.last_generation = earlier;

        let err = service
            .generate(&mut session, "a red fox", ImageSize::Square)
            .await
            .unwrap_err();

        assert!(!err.is_warning());
        assert!(err.to_string().starts_with("Error generating image:"));
        assert!(err.to_string().contains("Billing hard limit"));
        assert_eq!(session.last_generation, earlier);

        // A failed attempt does not start a cooldown
        assert!(service
            .generate(&mut session, "a red fox", ImageSize::Square)
            .await
            .is_err());
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_sessions_throttle_independently() {
        let stub = StubGenerator::ok();
        let service = service(&stub);
        let mut alice = authenticated();
        let mut bob = authenticated();

        service.generate(&mut alice, "a red fox", ImageSize::Square).await.unwrap();
        service.generate(&mut bob, "a grey wolf", ImageSize::Square).await.unwrap();

        assert!(service.generate(&mut alice, "again", ImageSize::Square).await.is_err());
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_long_prompt_is_capped_before_sending() {
        let stub = StubGenerator::ok();
        let service = service(&stub);
        let mut session = authenticated();

        service
            .generate(&mut session, &"é".repeat(2500), ImageSize::Square)
            .await
            .unwrap();

        let sent = stub.prompts.lock().unwrap()[0].0.clone();
        assert_eq!(sent.chars().count(), 1000);
    }
}
