//! Per-attachment relocation locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::attachment::AttachmentId;

/// In-process mutual exclusion keyed by attachment.
///
/// Only serializes relocations within one process. Across nodes the
/// conditional write in [`crate::attachment::AttachmentStore::commit_relocation`]
/// catches the race instead.
#[derive(Debug, Default)]
pub struct RelocationLocks {
    locks: DashMap<AttachmentId, Arc<Mutex<()>>>,
}

impl RelocationLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn acquire(&self, id: AttachmentId) -> RelocationGuard<'_> {
        let mutex = self.locks.entry(id).or_default().value().clone();
        let guard = mutex.lock_owned().await;
        RelocationGuard {
            locks: self,
            id,
            guard: Some(guard),
        }
    }

    /// Number of attachments with a live lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no lock entry is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held for the duration of one relocation.
#[derive(Debug)]
pub struct RelocationGuard<'a> {
    locks: &'a RelocationLocks,
    id: AttachmentId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RelocationGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold a clone of the Arc, so the entry survives while anyone queues.
        self.locks
            .locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
