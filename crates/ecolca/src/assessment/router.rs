use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use super::service::{AssessmentError, AssessmentService, EnvelopeError};

/// Router builder exposing submission, health and model reload endpoints.
pub fn assessment_router(service: Arc<AssessmentService>) -> Router {
    Router::new()
        .route("/api/submit-solution", post(submit_handler))
        .route("/api/health", get(health_handler))
        .route("/api/models/reload", post(reload_handler))
        .with_state(service)
}

fn failure(status: StatusCode, error: impl ToString) -> Response {
    let payload = json!({
        "success": false,
        "error": error.to_string(),
        "using_ml_models": false,
        "timestamp": Utc::now(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<AssessmentService>>,
    body: Bytes,
) -> Response {
    let envelope = match serde_json::from_slice::<Value>(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            let error = EnvelopeError::InvalidJson(err.to_string());
            warn!(error = %error, "rejected assessment submission");
            return failure(StatusCode::BAD_REQUEST, error);
        }
    };

    match service.submit_envelope(envelope).await {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(AssessmentError::Envelope(error)) => {
            warn!(error = %error, "rejected assessment submission");
            failure(StatusCode::BAD_REQUEST, error)
        }
        Err(other) => failure(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}

pub(crate) async fn health_handler(State(service): State<Arc<AssessmentService>>) -> Response {
    (StatusCode::OK, axum::Json(service.status())).into_response()
}

pub(crate) async fn reload_handler(State(service): State<Arc<AssessmentService>>) -> Response {
    match service.reload().await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(AssessmentError::Artifacts(error)) => failure(StatusCode::CONFLICT, error),
        Err(other) => failure(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}
