//! HTTP routes for the contact service.

use std::any::Any;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::config::Environment;
use crate::error::{StoreError, ValidationError};
use crate::model::ContactForm;
use crate::submission::SubmissionHandler;

pub const ACCEPTED_MESSAGE: &str = "Thank you! Your message has been received.";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";
pub const UNEXPECTED_MESSAGE: &str = "Failed to process message. Please try again later.";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: SubmissionHandler,
    pub environment: Environment,
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid request body")]
    InvalidBody,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A handler panicked. `detail` is only filled in development.
    #[error("Unexpected error")]
    Unexpected { detail: Option<String> },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "message": e.to_string() }),
            ),
            Self::InvalidBody => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "message": INVALID_BODY_MESSAGE }),
            ),
            Self::InvalidQuery(reason) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": format!("Invalid query: {reason}") }),
            ),
            Self::Store(e) if e.is_unavailable() => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "Message store unavailable" }),
            ),
            Self::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "Failed to retrieve messages" }),
            ),
            Self::Unexpected { detail } => {
                let mut body =
                    serde_json::json!({ "success": false, "message": UNEXPECTED_MESSAGE });
                if let Some(detail) = detail {
                    body["error"] = serde_json::Value::String(detail);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Build the router with the contact, listing and health routes.
pub fn contact_routes(state: AppState) -> Router {
    let development = state.environment.is_development();
    let router = Router::new()
        // Either path accepts either verb.
        .route("/api/contact", post(submit_contact).get(list_messages))
        .route("/api/messages", get(list_messages).post(submit_contact))
        .route("/api/health", get(health))
        .with_state(state);
    with_request_layers(router, development)
}

/// Request logging and panic recovery. Panics become the generic 500 body.
pub fn with_request_layers(router: Router, development: bool) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(
                move |panic: Box<dyn Any + Send + 'static>| panic_response(panic, development),
            )),
    )
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, development: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Request handler panicked");
    ApiError::Unexpected {
        detail: development.then_some(detail),
    }
    .into_response()
}

// ── Contact ─────────────────────────────────────────────────────────────

async fn submit_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(form) = body.map_err(|e| {
        debug!(error = %e, "Unreadable contact body");
        ApiError::InvalidBody
    })?;

    state.handler.submit(&form).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "success": true, "message": ACCEPTED_MESSAGE })),
    ))
}

// ── Messages ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

async fn list_messages(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let messages = state.handler.list_recent(params.limit).await?;
    Ok(Json(serde_json::json!({ "messages": messages })))
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "store": state.handler.store_backend(),
    }))
}
