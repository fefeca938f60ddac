use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::engine::EngineError;

/// Fixed body returned when a process instance could not be started.
/// Engine detail never reaches the caller.
pub const PROCESS_START_FAILED: &str = "Ошибка запуска процесса";

/// Handler errors and their HTTP mapping.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Process start failed: {0}")]
    ProcessStart(#[from] EngineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::ProcessStart(e) => {
                tracing::error!(
                    error = %e,
                    status = ?e.status(),
                    transport = e.is_transport(),
                    "Failed to start process instance"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, PROCESS_START_FAILED).into_response()
            }
        }
    }
}
