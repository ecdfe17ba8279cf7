use crate::config::ConfigError;
use crate::ratings::import::LedgerImportError;
use crate::ratings::service::RatingServiceError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("ledger import error: {0}")]
    Import(#[from] LedgerImportError),
    #[error("ledger error: {0}")]
    Ledger(#[from] RatingServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Ledger(
                RatingServiceError::Rating(_) | RatingServiceError::ProjectNotOwned { .. },
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Ledger(
                RatingServiceError::UnknownContractor(_)
                | RatingServiceError::UnknownProject(_)
                | RatingServiceError::UnknownComplaint(_),
            ) => StatusCode::NOT_FOUND,
            AppError::Ledger(RatingServiceError::Repository(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
