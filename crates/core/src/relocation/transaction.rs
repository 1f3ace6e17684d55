//! Two-phase relocation: move every file, then commit metadata.
//!
//! Metadata is only written once every move has succeeded. Any failure
//! after the first move undoes the completed moves in reverse order, so
//! a failed relocation leaves the attachment where it was.

use tracing::{error, info, warn};

use crate::attachment::{Attachment, AttachmentStore};
use crate::storage::FilesystemBackend;

use super::error::RelocationError;
use super::plan::{FileMove, RelocationPlan};

/// Executes one [`RelocationPlan`].
///
/// The caller must hold the attachment's relocation lock.
pub struct RelocationTransaction<'a, B: FilesystemBackend> {
    backend: &'a B,
    store: &'a dyn AttachmentStore,
}

impl<'a, B: FilesystemBackend> RelocationTransaction<'a, B> {
    /// Create a transaction over a writable backend and the attachment store.
    pub fn new(backend: &'a B, store: &'a dyn AttachmentStore) -> Self {
        Self { backend, store }
    }

    /// Move the files in `plan` and commit the new location for `attachment`.
    ///
    /// Returns the attachment as stored after the commit.
    pub async fn execute(
        &self,
        plan: &RelocationPlan,
        attachment: &Attachment,
    ) -> Result<Attachment, RelocationError> {
        let id = plan.attachment_id;
        info!(
            attachment_id = %id,
            from = %plan.primary.from,
            to = %plan.primary.to,
            target = %plan.target,
            "relocating attachment"
        );

        let dir = plan.destination_dir();
        if !dir.is_empty() {
            self.backend
                .mkdir_p(dir)
                .await
                .map_err(|source| RelocationError::DestinationUnavailable {
                    path: dir.to_string(),
                    source,
                })?;
        }

        // Variants whose source is gone have nothing to move.
        let mut pending = vec![plan.primary.clone()];
        for variant in &plan.variants {
            if self.backend.exists(&variant.from).await {
                pending.push(variant.clone());
            } else {
                warn!(attachment_id = %id, path = %variant.from, "variant file missing; skipping");
            }
        }

        // A rename replaces its target, so every destination must be free
        // before the first move.
        for m in &pending {
            if self.backend.exists(&m.to).await {
                warn!(attachment_id = %id, path = %m.to, "destination already taken");
                return Err(RelocationError::DestinationExists { path: m.to.clone() });
            }
        }

        self.backend
            .move_file(&plan.primary.from, &plan.primary.to)
            .await
            .map_err(|source| {
                error!(attachment_id = %id, from = %plan.primary.from, error = %source, "primary move failed");
                RelocationError::MoveFailed {
                    from: plan.primary.from.clone(),
                    to: plan.primary.to.clone(),
                    source,
                }
            })?;

        let mut completed = vec![plan.primary.clone()];
        for variant in &pending[1..] {
            if let Err(e) = self.backend.move_file(&variant.from, &variant.to).await {
                error!(attachment_id = %id, from = %variant.from, error = %e, "variant move failed");
                let rolled_back = self.rollback(&completed).await;
                return Err(RelocationError::PartialMoveFailure {
                    failed: vec![variant.from.clone()],
                    rolled_back,
                });
            }
            completed.push(variant.clone());
        }

        let committed = self
            .store
            .commit_relocation(
                id,
                &plan.primary.from,
                plan.new_path(),
                plan.target.is_private(),
            )
            .await;

        match committed {
            Ok(true) => {
                info!(attachment_id = %id, moved = completed.len(), "relocation committed");
                let mut updated = attachment.clone();
                updated.attached_path = plan.new_path().to_string();
                updated.is_private = plan.target.is_private();
                Ok(updated)
            }
            Ok(false) => {
                warn!(attachment_id = %id, "attachment changed during relocation");
                let cause = RelocationError::Conflict(id);
                if self.rollback(&completed).await {
                    Err(cause)
                } else {
                    Err(RelocationError::rollback_failed(id, cause))
                }
            }
            Err(e) => {
                error!(attachment_id = %id, error = %e, "metadata commit failed");
                let cause = RelocationError::Store(e);
                if self.rollback(&completed).await {
                    Err(cause)
                } else {
                    Err(RelocationError::rollback_failed(id, cause))
                }
            }
        }
    }

    /// Undo `completed` moves, newest first. Returns whether all were undone.
    async fn rollback(&self, completed: &[FileMove]) -> bool {
        let mut clean = true;
        for m in completed.iter().rev() {
            let undo = m.reversed();
            if let Err(e) = self.backend.move_file(&undo.from, &undo.to).await {
                error!(from = %undo.from, to = %undo.to, error = %e, "rollback move failed");
                clean = false;
            }
        }
        if clean {
            warn!(moves = completed.len(), "relocation rolled back");
        }
        clean
    }
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
