//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;
use warden_core::attachment::AttachmentError;
use warden_core::relocation::RelocationError;
use warden_shared::AppError;

/// Error rendered as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Create an error response.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 404 with the standard message.
    #[must_use]
    pub fn not_found() -> Self {
        AppError::NotFound("Attachment not found".to_string()).into()
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &err {
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                error!(error = %err, "request failed");
                "An error occurred".to_string()
            }
            AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Validation(m)
            | AppError::Conflict(m) => m.clone(),
        };
        Self::new(status, err.error_code(), message)
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::NotFound(_) => Self::not_found(),
            other => AppError::Database(other.to_string()).into(),
        }
    }
}

impl From<RelocationError> for ApiError {
    fn from(err: RelocationError) -> Self {
        match err {
            RelocationError::NoWriteAccess => Self::new(
                StatusCode::FORBIDDEN,
                "no_write_access",
                "Write access to the upload directory is unavailable",
            ),
            RelocationError::NotFound(_) => Self::not_found(),
            RelocationError::Conflict(_) => {
                AppError::Conflict("Attachment was modified concurrently, retry".to_string()).into()
            }
            RelocationError::DestinationExists { .. } => Self::new(
                StatusCode::CONFLICT,
                "destination_exists",
                "A file already exists at the destination",
            ),
            RelocationError::PartialMoveFailure { .. } => {
                error!(error = %err, "relocation failed part way");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "partial_move_failure",
                    "Some files could not be moved",
                )
            }
            RelocationError::RollbackFailed { .. } => {
                error!(error = %err, "relocation left files out of place");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "rollback_failed",
                    "Files could not be restored after a failed relocation",
                )
            }
            RelocationError::MoveFailed { .. } | RelocationError::DestinationUnavailable { .. } => {
                AppError::Storage(err.to_string()).into()
            }
            RelocationError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use warden_core::attachment::AttachmentId;

    #[rstest]
    #[case(RelocationError::NoWriteAccess, StatusCode::FORBIDDEN, "no_write_access")]
    #[case(RelocationError::NotFound(AttachmentId(1)), StatusCode::NOT_FOUND, "not_found")]
    #[case(RelocationError::Conflict(AttachmentId(1)), StatusCode::CONFLICT, "conflict")]
    #[case(
        RelocationError::PartialMoveFailure { failed: vec!["a.jpg".into()], rolled_back: true },
        StatusCode::INTERNAL_SERVER_ERROR,
        "partial_move_failure"
    )]
    #[case(
        RelocationError::RollbackFailed {
            id: AttachmentId(1),
            cause: Box::new(RelocationError::Conflict(AttachmentId(1))),
        },
        StatusCode::INTERNAL_SERVER_ERROR,
        "rollback_failed"
    )]
    #[case(
        RelocationError::Store(AttachmentError::repository("down")),
        StatusCode::INTERNAL_SERVER_ERROR,
        "database_error"
    )]
    fn test_relocation_error_mapping(
        #[case] err: RelocationError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let api: ApiError = err.into();
        assert_eq!(api.status(), status);
        assert_eq!(api.code(), code);
    }
}
