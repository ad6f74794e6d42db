//! HTTP server.
//!
//! Thin `axum` handlers over the [`Pipeline`]. Each handler deserializes a
//! typed request, calls one pipeline operation, and maps any
//! [`SynapsisError`] to a JSON error response.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Browser client |
//! | `GET`  | `/health` | Health check |
//! | `GET`  | `/modes` | List modes and the default mode |
//! | `POST` | `/save` | Save content as a file, then publish |
//! | `POST` | `/ask-ai` | Ask the AI through a mode, save the answer, then publish |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "invalid_mode", "message": "invalid mode id: unknown" } }
//! ```
//!
//! Error codes: `invalid_filename` (400), `invalid_mode` (400),
//! `persistence` (500), `upstream` (500), `configuration` (500).
//! Publish failures are not errors; they appear as `git_pushed: false` with
//! a `git_error` in an otherwise successful response.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the client page can
//! also be opened from disk or another local port.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::error::SynapsisError;
use crate::models::{AskRequest, AskResponse, ModesResponse, SaveRequest, SaveResponse};
use crate::pipeline::Pipeline;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Starts the HTTP server described by `config`.
///
/// Fails before binding if the API key, the mode file, or the data
/// directory cannot be set up; a misconfigured process never serves.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config(config, true, config.publish.enabled)?;
    run_server_with_pipeline(&config.server.bind, pipeline).await
}

/// Starts the HTTP server with a pre-built pipeline.
///
/// Used by tests and embedders that supply their own [`Publisher`] or
/// [`Assistant`] implementations.
///
/// [`Publisher`]: crate::publish::Publisher
/// [`Assistant`]: crate::llm::Assistant
pub async fn run_server_with_pipeline(bind_addr: &str, pipeline: Pipeline) -> anyhow::Result<()> {
    let app = router(pipeline);

    let listener = TcpListener::bind(bind_addr).await?;
    info!("Synapsis listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Builds the router with all routes and CORS applied.
pub fn router(pipeline: Pipeline) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/modes", get(handle_modes))
        .route("/save", post(handle_save))
        .route("/ask-ai", post(handle_ask))
        .layer(cors)
        .with_state(Arc::new(pipeline))
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl From<SynapsisError> for AppError {
    fn from(err: SynapsisError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            error!(code = err.code(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

// ============ Handlers ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn handle_modes(
    State(pipeline): State<Arc<Pipeline>>,
) -> Result<Json<ModesResponse>, AppError> {
    Ok(Json(pipeline.modes()?))
}

async fn handle_save(
    State(pipeline): State<Arc<Pipeline>>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    Ok(Json(pipeline.save(request).await?))
}

async fn handle_ask(
    State(pipeline): State<Arc<Pipeline>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    Ok(Json(pipeline.ask(request).await?))
}
