//! Access pages
//!
//! - GET / : login page, or the generator once the session is authenticated
//! - POST /login : check the shared password
//! - POST /logout : drop the session and its cookie

use axum::{
    extract::{Extension, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use super::generate::generator_page;
use super::middleware::{AppState, CurrentSession, WebError, CLEAR_SESSION_COOKIE};
use crate::pages::{LoginPage, Notice};
use crate::services::CredentialError;

/// Message shown after a wrong password
pub const INCORRECT_PASSWORD: &str = "Incorrect password!";

/// Form body for POST /login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Render the login page, with the configuration error when there is no
/// password to check against.
fn login_response(
    state: &AppState,
    status: StatusCode,
    notice: Option<Notice>,
) -> Result<Response, WebError> {
    let configured = state.credential_gate.is_configured();
    let notice = if configured {
        notice
    } else {
        Some(Notice::error(CredentialError::NotConfigured.to_string()))
    };
    let html = state.pages.render_login(&LoginPage { configured, notice })?;
    Ok((status, Html(html)).into_response())
}

/// GET /
async fn index(
    State(state): State<AppState>,
    Extension(CurrentSession { handle: session, .. }): Extension<CurrentSession>,
) -> Result<Response, WebError> {
    let authenticated = session.lock().await.authenticated;
    if !authenticated {
        return login_response(&state, StatusCode::OK, None);
    }

    let html = state.pages.render_generator(&generator_page(&state))?;
    Ok(Html(html).into_response())
}

/// POST /login
async fn login(
    State(state): State<AppState>,
    Extension(CurrentSession { handle: session, .. }): Extension<CurrentSession>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    // An empty submission is not an attempt
    if form.password.is_empty() {
        return login_response(&state, StatusCode::OK, None);
    }

    let mut session = session.lock().await;
    match state.credential_gate.check(&mut session, &form.password) {
        Ok(true) => Ok(Redirect::to("/").into_response()),
        Ok(false) => login_response(
            &state,
            StatusCode::UNAUTHORIZED,
            Some(Notice::error(INCORRECT_PASSWORD)),
        ),
        Err(CredentialError::NotConfigured) => {
            login_response(&state, StatusCode::SERVICE_UNAVAILABLE, None)
        }
    }
}

/// POST /logout
async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> impl IntoResponse {
    // Reset first so a request still holding the handle sees a locked session
    current.handle.lock().await.reset();
    state.sessions.remove(&current.token).await;
    tracing::info!("Session logged out");

    (
        [(header::SET_COOKIE, HeaderValue::from_static(CLEAR_SESSION_COOKIE))],
        Redirect::to("/"),
    )
}
