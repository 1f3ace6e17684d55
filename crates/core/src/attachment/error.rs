//! Attachment error types.

use thiserror::Error;

use super::types::AttachmentId;

/// Attachment store errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Attachment not found.
    #[error("attachment not found: {0}")]
    NotFound(AttachmentId),

    /// Stored record could not be mapped to the domain model.
    #[error("corrupt attachment record {id}: {reason}")]
    Corrupt {
        /// Offending record.
        id: AttachmentId,
        /// What was wrong with it.
        reason: String,
    },

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AttachmentError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: AttachmentId) -> Self {
        Self::NotFound(id)
    }

    /// Create a corrupt record error.
    #[must_use]
    pub fn corrupt(id: AttachmentId, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            id,
            reason: reason.into(),
        }
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
