//! Query adjustment before results are materialized.

use std::sync::Arc;

use tracing::debug;
use warden_shared::types::{PageRequest, PageResponse};

use crate::access::{AccessGate, RequestContext};
use crate::attachment::{
    Attachment, AttachmentError, AttachmentId, AttachmentStore, ListFilter, VisibilityConstraint,
};

/// What a query asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// The attachment collection.
    Collection,
    /// One attachment by id.
    ById(AttachmentId),
    /// One attachment by slug or file name.
    ByName(String),
}

/// An attachment query as issued by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentQuery {
    /// Query target.
    pub target: QueryTarget,
    /// Internal escape hatch: see private records regardless of the caller.
    pub show_private: bool,
    /// Page for collection queries.
    pub page: PageRequest,
}

impl AttachmentQuery {
    /// Collection query for one page.
    #[must_use]
    pub fn collection(page: PageRequest) -> Self {
        Self {
            target: QueryTarget::Collection,
            show_private: false,
            page,
        }
    }

    /// Lookup by id.
    #[must_use]
    pub fn by_id(id: AttachmentId) -> Self {
        Self {
            target: QueryTarget::ById(id),
            show_private: false,
            page: PageRequest::default(),
        }
    }

    /// Lookup by slug or file name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            target: QueryTarget::ByName(name.into()),
            show_private: false,
            page: PageRequest::default(),
        }
    }

    /// Bypass visibility rules.
    #[must_use]
    pub fn show_private(mut self) -> Self {
        self.show_private = true;
        self
    }
}

/// A query after visibility rules were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustedQuery {
    /// Return nothing.
    Empty,
    /// The single record the caller may see.
    One(Attachment),
    /// Run this listing.
    List(ListFilter),
}

/// Applies visibility rules to attachment queries.
#[derive(Clone)]
pub struct VisibilityQueryFilter {
    store: Arc<dyn AttachmentStore>,
}

impl VisibilityQueryFilter {
    /// Create a filter over `store`.
    pub fn new(store: Arc<dyn AttachmentStore>) -> Self {
        Self { store }
    }

    /// Adjust `query` for the caller described by `ctx`.
    ///
    /// Single lookups always resolve with private records included, then
    /// authorize: resolving is not the same as being allowed to see.
    pub async fn filter(
        &self,
        query: &AttachmentQuery,
        ctx: &RequestContext,
    ) -> Result<AdjustedQuery, AttachmentError> {
        let found = match &query.target {
            QueryTarget::Collection => {
                let visibility = if query.show_private {
                    VisibilityConstraint::Any
                } else {
                    ctx.listing_constraint()
                };
                return Ok(AdjustedQuery::List(ListFilter::new(visibility, query.page)));
            }
            QueryTarget::ById(id) => self.store.get(*id).await?,
            QueryTarget::ByName(name) => self.store.find_by_name(name, true).await?,
        };

        let Some(attachment) = found else {
            return Ok(AdjustedQuery::Empty);
        };

        let hidden =
            !ctx.is_admin_context && !query.show_private && !AccessGate::can_view(Some(&attachment), ctx);
        if hidden {
            debug!(attachment_id = %attachment.id, "attachment hidden from caller");
            return Ok(AdjustedQuery::Empty);
        }

        Ok(AdjustedQuery::One(attachment))
    }

    /// Run a single lookup. `None` means not found or not visible.
    pub async fn find_one(
        &self,
        query: &AttachmentQuery,
        ctx: &RequestContext,
    ) -> Result<Option<Attachment>, AttachmentError> {
        match self.filter(query, ctx).await? {
            AdjustedQuery::One(attachment) => Ok(Some(attachment)),
            AdjustedQuery::Empty | AdjustedQuery::List(_) => Ok(None),
        }
    }

    /// Run a collection query.
    pub async fn list(
        &self,
        page: PageRequest,
        ctx: &RequestContext,
    ) -> Result<PageResponse<Attachment>, AttachmentError> {
        match self.filter(&AttachmentQuery::collection(page), ctx).await? {
            AdjustedQuery::List(filter) => self.store.list(&filter).await,
            AdjustedQuery::Empty | AdjustedQuery::One(_) => {
                Ok(PageResponse::new(Vec::new(), page.page, page.per_page, 0))
            }
        }
    }
}
