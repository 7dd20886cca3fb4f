//! Web middleware and shared state
//!
//! Contains:
//! - Application state shared by all handlers
//! - Session cookie handling
//! - Error pages

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::config::Config;
use crate::pages::{PageError, PageRenderer};
use crate::services::{
    CredentialGate, GenerationError, GenerationService, ImageClient, ImageGenerator,
    SessionHandle, SessionStore,
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub credential_gate: Arc<CredentialGate>,
    pub generation: Arc<GenerationService>,
    pub pages: Arc<PageRenderer>,
}

impl AppState {
    /// Wire up every service from configuration.
    ///
    /// Missing secrets are not fatal: the affected feature reports a
    /// configuration error to the user instead.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let generator: Option<Arc<dyn ImageGenerator>> = match ImageClient::new(&config.provider) {
            Ok(client) => {
                tracing::info!("Image provider: {} ({})", client.endpoint(), config.provider.model);
                Some(Arc::new(client))
            }
            Err(GenerationError::MissingApiKey) => {
                tracing::error!("PROVIDER_API_KEY not found in environment, image generation is disabled");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let credential_gate = CredentialGate::new(config.auth.password_hash.clone());
        if !credential_gate.is_configured() {
            tracing::error!("APP_PASSWORD not found in environment, access is disabled");
        }

        Ok(Self {
            sessions: SessionStore::new(config.auth.session_idle(), config.auth.max_sessions),
            credential_gate: Arc::new(credential_gate),
            generation: Arc::new(GenerationService::new(generator, config.generation.cooldown())),
            pages: Arc::new(PageRenderer::new()?),
        })
    }
}

/// The session attached to the current request by [`session_middleware`]
#[derive(Clone)]
pub struct CurrentSession {
    pub token: String,
    pub handle: SessionHandle,
}

/// Extract session token from the `session` cookie
fn extract_session_token(request: &Request) -> Option<String> {
    let cookie_header = request.headers().get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;
    let prefix = format!("{}=", SESSION_COOKIE);
    cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()))
        .find(|token| !token.is_empty())
        .map(String::from)
}

fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// `Set-Cookie` value that makes the browser drop its session token
pub const CLEAR_SESSION_COOKIE: &str = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

/// Session middleware
///
/// Resolves the session cookie, starting a new session when it is missing or
/// expired, and hands the session to handlers as a [`CurrentSession`].
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = extract_session_token(&request);
    let (token, handle, created) = state.sessions.get_or_create(presented.as_deref()).await;
    request.extensions_mut().insert(CurrentSession {
        token: token.clone(),
        handle,
    });

    let mut response = next.run(request).await;

    // Handlers that set their own cookie (logout) take precedence
    if response.headers().contains_key(header::SET_COOKIE) {
        return response;
    }
    if created {
        match HeaderValue::from_str(&session_cookie(&token)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Failed to build session cookie: {}", e),
        }
    }
    response
}

/// Error response for failures that cannot be shown on a page
#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<PageError> for WebError {
    fn from(e: PageError) -> Self {
        Self::internal_error(e.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}: {}", self.status, self.message);
        }
        // Internal details stay in the log
        let body = self
            .status
            .canonical_reason()
            .unwrap_or("Something went wrong")
            .to_string();
        (self.status, body).into_response()
    }
}
