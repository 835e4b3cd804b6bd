use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tokio::task::JoinError;

use crate::classifier::ClassifierError;

/// Every failure a request can end in, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("{message}")]
    Payload { status: StatusCode, message: String },
    #[error("Classification task failed: {0}")]
    Task(#[from] JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Classifier(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Classifier(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payload { status, .. } => *status,
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            // Keeps 413 for bodies over the configured limit.
            JsonRejection::BytesRejection(_) => rejection.status(),
            _ => StatusCode::BAD_REQUEST,
        };
        Self::Payload {
            status,
            message: format!("Invalid request body: {}", rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("❌ Classification error: {}", self);
        } else {
            log::warn!("Rejected request ({}): {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
