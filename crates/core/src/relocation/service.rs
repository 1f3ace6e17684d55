//! Visibility changes, end to end.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::attachment::{Attachment, AttachmentId, AttachmentStore, Visibility};
use crate::private_dir::KeyedDirectoryResolver;
use crate::storage::{WriteAccess, WriteCredentials};

use super::error::RelocationError;
use super::lock::RelocationLocks;
use super::plan::{PathPlanner, PlanOutcome};
use super::transaction::RelocationTransaction;

/// Successful result of [`VisibilityService::set_visibility`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// Files moved and metadata updated.
    Relocated(Attachment),
    /// Nothing to move.
    AlreadyInTargetState(Attachment),
}

impl RelocationOutcome {
    /// The attachment after the call.
    #[must_use]
    pub fn attachment(&self) -> &Attachment {
        match self {
            Self::Relocated(a) | Self::AlreadyInTargetState(a) => a,
        }
    }

    /// Consume into the attachment.
    #[must_use]
    pub fn into_attachment(self) -> Attachment {
        match self {
            Self::Relocated(a) | Self::AlreadyInTargetState(a) => a,
        }
    }

    /// Whether any file moved.
    #[must_use]
    pub const fn relocated(&self) -> bool {
        matches!(self, Self::Relocated(_))
    }
}

/// Moves attachments between the public and private partitions.
pub struct VisibilityService<W: WriteAccess> {
    store: Arc<dyn AttachmentStore>,
    access: Arc<W>,
    resolver: KeyedDirectoryResolver,
    locks: RelocationLocks,
}

impl<W: WriteAccess> VisibilityService<W> {
    /// Create a service.
    pub fn new(
        store: Arc<dyn AttachmentStore>,
        access: Arc<W>,
        resolver: KeyedDirectoryResolver,
    ) -> Self {
        Self {
            store,
            access,
            resolver,
            locks: RelocationLocks::new(),
        }
    }

    /// Directory resolver in use.
    pub fn resolver(&self) -> &KeyedDirectoryResolver {
        &self.resolver
    }

    /// Bring attachment `id` into the `target` partition.
    ///
    /// Relocations of the same attachment are serialized. Without write
    /// access nothing is read or changed.
    pub async fn set_visibility(
        &self,
        id: AttachmentId,
        target: Visibility,
        credentials: Option<&WriteCredentials>,
    ) -> Result<RelocationOutcome, RelocationError> {
        let _guard = self.locks.acquire(id).await;

        let Some(backend) = self.access.acquire_write_access(credentials) else {
            warn!(attachment_id = %id, "visibility change refused: no write access");
            return Err(RelocationError::NoWriteAccess);
        };

        let attachment = self
            .store
            .get(id)
            .await?
            .ok_or(RelocationError::NotFound(id))?;

        let private_dir = self.resolver.resolve_private_dir(&backend).await;
        let planner = PathPlanner::new(private_dir);

        match planner.plan(&attachment, target) {
            PlanOutcome::NoOp => {
                debug!(attachment_id = %id, %target, "attachment already in target partition");
                self.align_flag(attachment, target).await
            }
            PlanOutcome::Relocate(plan) => {
                let updated = RelocationTransaction::new(&backend, self.store.as_ref())
                    .execute(&plan, &attachment)
                    .await?;
                Ok(RelocationOutcome::Relocated(updated))
            }
        }
    }

    /// Repair a flag that disagrees with where the files already are.
    async fn align_flag(
        &self,
        mut attachment: Attachment,
        target: Visibility,
    ) -> Result<RelocationOutcome, RelocationError> {
        // A record without a primary file has no location to agree with.
        if attachment.has_file() && attachment.is_private != target.is_private() {
            info!(attachment_id = %attachment.id, %target, "correcting visibility flag");
            self.store
                .set_visibility(attachment.id, target.is_private())
                .await?;
            attachment.is_private = target.is_private();
        }
        Ok(RelocationOutcome::AlreadyInTargetState(attachment))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
