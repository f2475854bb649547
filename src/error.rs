//! Error types for the campaign tracker

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes reported alongside every failed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 2,
    BadValue = 3,
    NoSuchCampaign = 4,
    NoSuchSource = 5,
    InvalidReferral = 6,
    Duplicate = 7,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid referral code: {0}")]
    InvalidReferral(String),

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("UTM source not found: {0}")]
    SourceNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidReferral(_)
            | AppError::CampaignNotFound(_)
            | AppError::SourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorCode::BadValue,
            AppError::InvalidReferral(_) => ErrorCode::InvalidReferral,
            AppError::CampaignNotFound(_) => ErrorCode::NoSuchCampaign,
            AppError::SourceNotFound(_) => ErrorCode::NoSuchSource,
            AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    /// Message safe to hand back to the caller; storage details stay in the logs
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::InvalidReferral(msg)
            | AppError::CampaignNotFound(msg)
            | AppError::SourceNotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Always false
    pub ok: bool,
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = Json(ErrorResponse {
            ok: false,
            code: code as u32,
            error: format!("{:?}", code),
            message: self.public_message(),
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_variants_are_distinct() {
        let referral = AppError::InvalidReferral("bad".into());
        let campaign = AppError::CampaignNotFound("x".into());
        let source = AppError::SourceNotFound("y".into());

        for err in [&referral, &campaign, &source] {
            assert_eq!(err.status(), StatusCode::NOT_FOUND);
        }
        assert_ne!(referral.code(), campaign.code());
        assert_ne!(campaign.code(), source.code());
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = AppError::Internal("connection reset by peer".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = AppError::Validation("clientEmail is required".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::BadValue);
    }
}
