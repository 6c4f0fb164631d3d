use crate::{errors::ServiceError, AppState};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// Liveness probe with a database ping.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    state.db.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}
