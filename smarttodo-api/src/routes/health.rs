/// Health check and welcome endpoints
///
/// # Endpoints
///
/// ```text
/// GET /        -> {"message": "Welcome to Smart Todo API!"}
/// GET /health  -> {"status": "OK", "database": "connected"}
/// ```
///
/// The health check answers 500 with `"Database connection failed"` when
/// the storage probe fails.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Storage status
    pub database: String,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Welcome handler
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to Smart Todo API!".to_string(),
    })
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::StoreUnavailable(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "OK".to_string(),
        database: "connected".to_string(),
    }))
}
