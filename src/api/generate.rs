//! Image generation page
//!
//! POST /generate runs the generation pipeline for the current session and
//! re-renders the generator with the image or the reason there is none.

use axum::{
    extract::{Extension, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::post,
    Form, Router,
};
use serde::Deserialize;

use super::middleware::{AppState, CurrentSession, WebError};
use crate::models::ImageSize;
use crate::pages::{GeneratorPage, ImageView, Notice};
use crate::services::{GenerationError, PipelineError};

/// Form body for POST /generate
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub size: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

/// Empty generator page, carrying the configuration error if generation is
/// disabled.
pub(crate) fn generator_page(state: &AppState) -> GeneratorPage {
    let configured = state.generation.is_configured();
    let page = GeneratorPage::new(configured, state.generation.cooldown().as_secs());
    if configured {
        page
    } else {
        page.with_notice(Notice::error(GenerationError::MissingApiKey.to_string()))
    }
}

fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Unauthenticated => StatusCode::UNAUTHORIZED,
        PipelineError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::EmptyPrompt => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        PipelineError::Generation(_) => StatusCode::BAD_GATEWAY,
    }
}

/// POST /generate
async fn generate(
    State(state): State<AppState>,
    Extension(CurrentSession { handle: session, .. }): Extension<CurrentSession>,
    Form(form): Form<GenerateForm>,
) -> Result<Response, WebError> {
    // Held until the response is built: one generation at a time per session
    let mut session = session.lock().await;
    if !session.authenticated {
        return Ok(Redirect::to("/").into_response());
    }

    let size = if form.size.trim().is_empty() {
        ImageSize::default()
    } else {
        match form.size.parse::<ImageSize>() {
            Ok(size) => size,
            Err(e) => {
                let page = generator_page(&state)
                    .with_prompt(form.prompt, ImageSize::default())
                    .with_notice(Notice::error(e.to_string()));
                let html = state.pages.render_generator(&page)?;
                return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
            }
        }
    };

    let page = generator_page(&state).with_prompt(form.prompt.clone(), size);

    match state.generation.generate(&mut session, &form.prompt, size).await {
        Ok(image) => {
            let html = state
                .pages
                .render_generator(&page.with_image(ImageView::from_generated(&image)?))?;
            Ok(Html(html).into_response())
        }
        Err(error) => {
            let status = status_for(&error);
            let notice = if error.is_warning() {
                Notice::warning(error.to_string())
            } else {
                Notice::error(error.to_string())
            };
            let html = state.pages.render_generator(&page.with_notice(notice))?;

            let mut response = (status, Html(html)).into_response();
            if let PipelineError::RateLimited { wait_seconds, .. } = error {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(wait_seconds));
            }
            Ok(response)
        }
    }
}
