//! Local stand-in for the image provider, served on 127.0.0.1:0.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How the fake provider answers
#[derive(Debug, Clone)]
pub enum ProviderBehavior {
    /// Point at a solid-colour PNG of this size
    Png { width: u32, height: u32 },
    /// Reject the generation call with this status and body
    Reject { status: u16, body: String },
    /// Point at an HTML error page served with 200
    HtmlAsset,
    /// Point at an asset that 404s
    MissingAsset,
    /// Succeed with an empty `data` array
    NoImage,
}

#[derive(Clone)]
struct MockState {
    behavior: Arc<ProviderBehavior>,
    origin: String,
    requests: Arc<Mutex<Vec<Value>>>,
    authorization: Arc<Mutex<Option<String>>>,
    asset_fetches: Arc<AtomicUsize>,
}

/// Handle to a running fake provider
pub struct MockProvider {
    /// Value for `ProviderConfig::base_url`
    pub base_url: String,
    state: MockState,
}

impl MockProvider {
    /// JSON bodies received on `images/generations`
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Last Authorization header seen on `images/generations`
    pub fn authorization(&self) -> Option<String> {
        self.state.authorization.lock().unwrap().clone()
    }

    pub fn asset_fetches(&self) -> usize {
        self.state.asset_fetches.load(Ordering::SeqCst)
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(width, height, Rgb([214u8, 92, 30]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

async fn generations(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().unwrap().push(body);
    *state.authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    match state.behavior.as_ref() {
        ProviderBehavior::Reject { status, body } => (
            StatusCode::from_u16(*status).unwrap(),
            [(header::CONTENT_TYPE, "application/json")],
            body.clone(),
        )
            .into_response(),
        ProviderBehavior::NoImage => Json(json!({ "created": 1700000000, "data": [] })).into_response(),
        _ => Json(json!({
            "created": 1700000000,
            "data": [{
                "url": format!("{}/assets/generated.png", state.origin),
                "revised_prompt": "A red fox standing in a snowy forest"
            }]
        }))
        .into_response(),
    }
}

async fn asset(State(state): State<MockState>) -> Response {
    state.asset_fetches.fetch_add(1, Ordering::SeqCst);
    match state.behavior.as_ref() {
        ProviderBehavior::Png { width, height } => (
            [(header::CONTENT_TYPE, "image/png")],
            png_bytes(*width, *height),
        )
            .into_response(),
        ProviderBehavior::HtmlAsset => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body><h1>AuthenticationFailed</h1></body></html>",
        )
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Start a fake provider; it lives until the test runtime shuts down.
pub async fn spawn_provider(behavior: ProviderBehavior) -> MockProvider {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());

    let state = MockState {
        behavior: Arc::new(behavior),
        origin: origin.clone(),
        requests: Arc::new(Mutex::new(Vec::new())),
        authorization: Arc::new(Mutex::new(None)),
        asset_fetches: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/v1/images/generations", post(generations))
        .route("/assets/generated.png", get(asset))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockProvider {
        base_url: format!("{}/v1", origin),
        state,
    }
}
