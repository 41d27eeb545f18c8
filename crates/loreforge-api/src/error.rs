//! Loreforge API — error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loreforge_core::error::DomainError;
use loreforge_narrative::domain::error::TurnError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Tracing or span export could not be set up.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A turn ended without a narrative.
    Turn(TurnError),
    /// A direct collaborator call failed.
    Domain(DomainError),
}

impl From<TurnError> for ApiError {
    fn from(err: TurnError) -> Self {
        Self::Turn(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

fn domain_status(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::Infrastructure(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
        }
        DomainError::Reasoning(_) => (StatusCode::BAD_GATEWAY, "reasoning_error"),
        DomainError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "turn_cancelled"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Self::Turn(TurnError::Cancelled { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "turn_cancelled")
            }
            Self::Turn(TurnError::Persistence(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error")
            }
            Self::Turn(TurnError::Collaborator { source, .. }) => match source {
                DomainError::NotFound(_) | DomainError::Validation(_) => domain_status(source),
                _ => (StatusCode::BAD_GATEWAY, "collaborator_error"),
            },
            Self::Domain(err) => domain_status(err),
        };

        let message = match &self {
            Self::Turn(err) => err.to_string(),
            Self::Domain(err) => err.to_string(),
        };
        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreforge_narrative::domain::report::TurnStage;
    use uuid::Uuid;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_cancelled_turn_maps_to_503() {
        assert_eq!(
            status_of(TurnError::Cancelled {
                stage: TurnStage::Guard
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_persistence_failure_maps_to_500() {
        assert_eq!(
            status_of(TurnError::Persistence(DomainError::Infrastructure(
                "db down".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_collaborator_failure_maps_to_502() {
        assert_eq!(
            status_of(TurnError::Collaborator {
                stage: TurnStage::Resolve,
                source: DomainError::Reasoning("timeout".into()),
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_missing_character_maps_to_404() {
        assert_eq!(
            status_of(TurnError::Collaborator {
                stage: TurnStage::Resolve,
                source: DomainError::NotFound(Uuid::new_v4()),
            }),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
