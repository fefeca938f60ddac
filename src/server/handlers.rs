//! HTTP handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::error::AppError;
use super::AppState;

/// POST /start-process: start one process instance and echo the engine's
/// instance descriptor.
///
/// The body is read as raw bytes and never rejected. `name` is forwarded
/// exactly as sent; a missing field, a body that is not a JSON object, or a
/// body that is not JSON at all all forward `null`.
pub async fn start_process(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let instance = state.trigger.start(applicant_name(&body)).await?;
    Ok(Json(instance))
}

fn applicant_name(body: &[u8]) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|mut parsed| parsed.get_mut("name").map(Value::take))
        .unwrap_or(Value::Null)
}

// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
