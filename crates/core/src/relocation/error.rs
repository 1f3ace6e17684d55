//! Relocation error types.

use thiserror::Error;

use crate::attachment::{AttachmentError, AttachmentId};
use crate::storage::StorageError;

/// Errors that abort a visibility change.
///
/// Every variant except [`RelocationError::RollbackFailed`] and
/// [`RelocationError::PartialMoveFailure`] with `rolled_back == false`
/// leaves files and metadata as they were.
#[derive(Debug, Error)]
pub enum RelocationError {
    /// Write credentials missing or rejected. Nothing was touched.
    #[error("write access to the upload tree is unavailable")]
    NoWriteAccess,

    /// Attachment does not exist.
    #[error("attachment not found: {0}")]
    NotFound(AttachmentId),

    /// Destination directory could not be created.
    #[error("cannot create destination directory {path}: {source}")]
    DestinationUnavailable {
        /// Directory path.
        path: String,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },

    /// A destination file is already taken. Nothing was moved.
    #[error("destination already exists: {path}")]
    DestinationExists {
        /// Occupied path.
        path: String,
    },

    /// Primary file move failed; nothing else was moved.
    #[error("cannot move {from} to {to}: {source}")]
    MoveFailed {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },

    /// A variant move failed after other moves completed.
    #[error("variant move failed for {failed:?} (rolled back: {rolled_back})")]
    PartialMoveFailure {
        /// Source paths that could not be moved.
        failed: Vec<String>,
        /// Whether every completed move was undone.
        rolled_back: bool,
    },

    /// Attachment was relocated by someone else meanwhile.
    #[error("attachment {0} was modified concurrently")]
    Conflict(AttachmentId),

    /// Attachment store failure.
    #[error(transparent)]
    Store(#[from] AttachmentError),

    /// Commit was abandoned and the completed moves could not all be undone.
    /// Files may sit in the target partition while metadata names the old one.
    #[error("relocation of attachment {id} abandoned ({cause}) and rollback failed")]
    RollbackFailed {
        /// Attachment being relocated.
        id: AttachmentId,
        /// Why the commit was abandoned.
        cause: Box<RelocationError>,
    },
}

impl RelocationError {
    /// Whether storage may be left inconsistent with metadata.
    #[must_use]
    pub const fn is_inconsistent(&self) -> bool {
        matches!(
            self,
            Self::PartialMoveFailure {
                rolled_back: false,
                ..
            } | Self::RollbackFailed { .. }
        )
    }

    pub(crate) fn rollback_failed(id: AttachmentId, cause: Self) -> Self {
        Self::RollbackFailed {
            id,
            cause: Box::new(cause),
        }
    }
}
