use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use log::info;
use serde::Serialize;

use super::error::ApiError;
use super::AppState;
use crate::classifier::{ClassifyRequest, Prediction};
use crate::labels::LabelSet;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub labels: LabelSet,
}

/// `POST /api/classify`
pub async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    info!("📸 Received classification request");
    let Json(request) = payload?;

    // Decoding, resizing and inference are CPU-bound.
    let classifier = Arc::clone(&state.classifier);
    let prediction = tokio::task::spawn_blocking(move || classifier.classify(&request)).await??;

    Ok(Json(prediction))
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: state.status.to_string(),
        labels: state.classifier.labels().clone(),
    })
}
