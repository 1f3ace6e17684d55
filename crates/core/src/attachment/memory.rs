//! In-memory attachment store.

use async_trait::async_trait;
use dashmap::DashMap;
use warden_shared::types::PageResponse;

use super::error::AttachmentError;
use super::store::{AttachmentStore, ListFilter};
use super::types::{Attachment, AttachmentId};

/// Attachment store backed by a concurrent map.
///
/// Used by tests and single-node development setups.
#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    attachments: DashMap<AttachmentId, Attachment>,
}

impl InMemoryAttachmentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given attachments.
    #[must_use]
    pub fn with_attachments(attachments: impl IntoIterator<Item = Attachment>) -> Self {
        let store = Self::new();
        for attachment in attachments {
            store.insert(attachment);
        }
        store
    }

    /// Insert or replace an attachment, as the host does on upload.
    pub fn insert(&self, attachment: Attachment) {
        self.attachments.insert(attachment.id, attachment);
    }

    /// Snapshot of all attachments ordered by ID.
    fn sorted(&self) -> Vec<Attachment> {
        let mut all: Vec<Attachment> = self.attachments.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|a| a.id);
        all
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, AttachmentError> {
        Ok(self.attachments.get(&id).map(|e| e.value().clone()))
    }

    async fn find_by_name(
        &self,
        name: &str,
        include_private: bool,
    ) -> Result<Option<Attachment>, AttachmentError> {
        Ok(self
            .sorted()
            .into_iter()
            .filter(|a| include_private || !a.is_private)
            .find(|a| a.matches_name(name)))
    }

    async fn update_path(&self, id: AttachmentId, new_path: &str) -> Result<(), AttachmentError> {
        let mut entry = self
            .attachments
            .get_mut(&id)
            .ok_or_else(|| AttachmentError::not_found(id))?;
        entry.attached_path = new_path.to_string();
        Ok(())
    }

    async fn set_visibility(
        &self,
        id: AttachmentId,
        is_private: bool,
    ) -> Result<(), AttachmentError> {
        let mut entry = self
            .attachments
            .get_mut(&id)
            .ok_or_else(|| AttachmentError::not_found(id))?;
        entry.is_private = is_private;
        Ok(())
    }

    async fn list(&self, filter: &ListFilter) -> Result<PageResponse<Attachment>, AttachmentError> {
        let matching: Vec<Attachment> = self
            .sorted()
            .into_iter()
            .filter(|a| filter.visibility.admits(a))
            .collect();
        let total = matching.len() as u64;
        let offset = usize::try_from(filter.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.page.limit()).unwrap_or(usize::MAX);
        let data = matching.into_iter().skip(offset).take(limit).collect();

        Ok(PageResponse::new(
            data,
            filter.page.page,
            filter.page.per_page,
            total,
        ))
    }

    async fn commit_relocation(
        &self,
        id: AttachmentId,
        expected_path: &str,
        new_path: &str,
        is_private: bool,
    ) -> Result<bool, AttachmentError> {
        // The shard write lock makes the compare and the swap one step.
        let mut entry = self
            .attachments
            .get_mut(&id)
            .ok_or_else(|| AttachmentError::not_found(id))?;
        if entry.attached_path != expected_path {
            return Ok(false);
        }
        entry.attached_path = new_path.to_string();
        entry.is_private = is_private;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::VisibilityConstraint;
    use warden_shared::types::PageRequest;

    fn store() -> InMemoryAttachmentStore {
        InMemoryAttachmentStore::with_attachments([
            Attachment::new(3, "c", "2024/c.pdf", "application/pdf").with_private(true),
            Attachment::new(1, "a", "2024/a.jpg", "image/jpeg"),
            Attachment::new(2, "b", "2024/b.jpg", "image/jpeg"),
        ])
    }

    #[tokio::test]
    async fn test_list_orders_and_filters() {
        let store = store();

        let public = store
            .list(&ListFilter::new(VisibilityConstraint::PublicOnly, PageRequest::default()))
            .await
            .unwrap();
        let ids: Vec<i64> = public.data.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(public.meta.total, 2);

        let private = store
            .list(&ListFilter::new(VisibilityConstraint::PrivateOnly, PageRequest::default()))
            .await
            .unwrap();
        assert_eq!(private.data.len(), 1);
        assert_eq!(private.data[0].id, AttachmentId(3));

        let any = store
            .list(&ListFilter::new(VisibilityConstraint::Any, PageRequest::default()))
            .await
            .unwrap();
        assert_eq!(any.meta.total, 3);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let store = store();
        let page = store
            .list(&ListFilter::new(VisibilityConstraint::Any, PageRequest::new(2, 2)))
            .await
            .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, AttachmentId(3));
        assert_eq!(page.meta.total_pages, 2);
    }

    #[tokio::test]
    async fn test_find_by_name_respects_include_private() {
        let store = store();

        assert!(store.find_by_name("c", false).await.unwrap().is_none());
        assert!(store.find_by_name("c.pdf", true).await.unwrap().is_some());
        assert_eq!(
            store.find_by_name("a.jpg", false).await.unwrap().map(|a| a.id),
            Some(AttachmentId(1))
        );
    }

    #[tokio::test]
    async fn test_commit_relocation_compares_path() {
        let store = store();

        let stale = store
            .commit_relocation(AttachmentId(1), "elsewhere/a.jpg", "p/2024/a.jpg", true)
            .await
            .unwrap();
        assert!(!stale);
        assert_eq!(store.get(AttachmentId(1)).await.unwrap().unwrap().attached_path, "2024/a.jpg");

        let committed = store
            .commit_relocation(AttachmentId(1), "2024/a.jpg", "p/2024/a.jpg", true)
            .await
            .unwrap();
        assert!(committed);
        let updated = store.get(AttachmentId(1)).await.unwrap().unwrap();
        assert_eq!(updated.attached_path, "p/2024/a.jpg");
        assert!(updated.is_private);
    }

    #[tokio::test]
    async fn test_updates_on_missing_record_fail() {
        let store = InMemoryAttachmentStore::new();

        assert!(matches!(
            store.update_path(AttachmentId(9), "x").await,
            Err(AttachmentError::NotFound(AttachmentId(9)))
        ));
        assert!(matches!(
            store.set_visibility(AttachmentId(9), true).await,
            Err(AttachmentError::NotFound(_))
        ));
        assert!(matches!(
            store.commit_relocation(AttachmentId(9), "a", "b", true).await,
            Err(AttachmentError::NotFound(_))
        ));
    }
}
