use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::meals::services::LogMealError;
use crate::nutrition::ResolutionError;

/// Application-level error type for HTTP handlers.
///
/// Meal-capture failures keep their own variants so clients can tell an
/// unusable photo from a storage outage.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("persistence failed: {0:#}")]
    Persistence(anyhow::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A third-party service (other than photo analysis) failed.
    #[error("upstream service failed: {0:#}")]
    Upstream(anyhow::Error),

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<LogMealError> for AppError {
    fn from(e: LogMealError) -> Self {
        match e {
            LogMealError::Resolution(r) => AppError::Resolution(r),
            LogMealError::PersistenceFailed(p) => AppError::Persistence(p),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

const RETAKE_PHOTO: &str = "retake_photo";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, action) = match &self {
            AppError::Resolution(r) => {
                let (status, code, message) = match r {
                    ResolutionError::EmptyImage => {
                        (StatusCode::BAD_REQUEST, "EMPTY_IMAGE", r.to_string())
                    }
                    ResolutionError::InvalidImage(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_IMAGE", r.to_string())
                    }
                    // the reason may quote the vision provider's reply
                    ResolutionError::AnalysisFailed(reason) => {
                        tracing::warn!(%reason, "meal photo analysis failed");
                        (
                            StatusCode::BAD_GATEWAY,
                            "ANALYSIS_FAILED",
                            "The meal photo could not be analyzed".to_string(),
                        )
                    }
                    ResolutionError::InvalidNutrition { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_NUTRITION", r.to_string())
                    }
                };
                (status, code, message, Some(RETAKE_PHOTO))
            }
            AppError::Persistence(e) => {
                tracing::error!(error = %format!("{e:#}"), "meal persistence failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_FAILED",
                    "The meal could not be saved".to_string(),
                    None,
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            AppError::Validation(errs) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errs.to_string(),
                None,
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                msg.to_string(),
                None,
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{what} not found"),
                None,
            ),
            AppError::Upstream(e) => {
                tracing::warn!(error = %format!("{e:#}"), "upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "An upstream service is unavailable".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(action) = action {
            body["action"] = json!(action);
        }

        (status, axum::Json(body)).into_response()
    }
}
