//! The attachment store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_shared::types::{PageRequest, PageResponse};

use super::error::AttachmentError;
use super::types::{Attachment, AttachmentId};

/// Which partition a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityConstraint {
    /// Both partitions.
    Any,
    /// Public attachments only.
    #[default]
    PublicOnly,
    /// Private attachments only.
    PrivateOnly,
}

impl VisibilityConstraint {
    /// Whether an attachment passes the constraint.
    #[must_use]
    pub const fn admits(self, attachment: &Attachment) -> bool {
        match self {
            Self::Any => true,
            Self::PublicOnly => !attachment.is_private,
            Self::PrivateOnly => attachment.is_private,
        }
    }
}

/// Listing parameters handed to [`AttachmentStore::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListFilter {
    /// Partition constraint.
    pub visibility: VisibilityConstraint,
    /// Requested page.
    pub page: PageRequest,
}

impl ListFilter {
    /// Create a listing filter.
    #[must_use]
    pub const fn new(visibility: VisibilityConstraint, page: PageRequest) -> Self {
        Self { visibility, page }
    }
}

/// Persistence contract for attachment metadata.
///
/// Implemented by the db crate on PostgreSQL and by [`super::InMemoryAttachmentStore`].
/// `attached_path` and `is_private` are only ever written by relocation.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Find attachment by ID.
    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, AttachmentError>;

    /// Find attachment by slug or primary file name.
    ///
    /// Private attachments are only considered when `include_private` is set.
    async fn find_by_name(
        &self,
        name: &str,
        include_private: bool,
    ) -> Result<Option<Attachment>, AttachmentError>;

    /// Point the attachment at a new primary file path.
    async fn update_path(&self, id: AttachmentId, new_path: &str) -> Result<(), AttachmentError>;

    /// Set or clear the visibility flag.
    async fn set_visibility(&self, id: AttachmentId, is_private: bool)
    -> Result<(), AttachmentError>;

    /// List attachments ordered by ID.
    async fn list(&self, filter: &ListFilter) -> Result<PageResponse<Attachment>, AttachmentError>;

    /// Commit a relocation: new path and flag, only if the path is still `expected_path`.
    ///
    /// Returns `Ok(false)` when another writer moved the attachment first.
    /// Stores shared between nodes must override this with a single conditional write.
    async fn commit_relocation(
        &self,
        id: AttachmentId,
        expected_path: &str,
        new_path: &str,
        is_private: bool,
    ) -> Result<bool, AttachmentError> {
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| AttachmentError::not_found(id))?;
        if current.attached_path != expected_path {
            return Ok(false);
        }
        self.update_path(id, new_path).await?;
        self.set_visibility(id, is_private).await?;
        Ok(true)
    }
}
