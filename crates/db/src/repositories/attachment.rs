//! Attachment repository for database operations.
//!
//! Implements the attachment store using SeaORM.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use tracing::debug;
use warden_core::attachment::{
    Attachment, AttachmentError, AttachmentId, AttachmentStore, ListFilter, Variant,
    VisibilityConstraint,
};
use warden_shared::types::PageResponse;

use crate::entities::attachments;

/// Input for registering an uploaded file.
#[derive(Debug, Clone)]
pub struct CreateAttachmentInput {
    /// Lookup name.
    pub slug: String,
    /// Primary file path relative to the upload root.
    pub attached_path: String,
    /// Content type.
    pub mime_type: String,
    /// Derived files next to the primary file.
    pub variants: Vec<Variant>,
}

/// Attachment repository implementation.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register an uploaded file as a public attachment.
    pub async fn create(&self, input: CreateAttachmentInput) -> Result<Attachment, AttachmentError> {
        let variants = serde_json::to_value(&input.variants)
            .map_err(|e| AttachmentError::repository(e.to_string()))?;
        let now = Utc::now();

        let active_model = attachments::ActiveModel {
            slug: Set(input.slug),
            attached_file: Set(input.attached_path),
            mime_type: Set(input.mime_type),
            variants: Set(variants),
            is_private: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(repository_error)?;

        to_domain(model)
    }

    async fn exists(&self, id: AttachmentId) -> Result<bool, AttachmentError> {
        let count = attachments::Entity::find_by_id(id.0)
            .count(&self.db)
            .await
            .map_err(repository_error)?;
        Ok(count > 0)
    }

    async fn update_columns(
        &self,
        id: AttachmentId,
        columns: Vec<(attachments::Column, SimpleExpr)>,
    ) -> Result<(), AttachmentError> {
        let mut update = attachments::Entity::update_many()
            .col_expr(attachments::Column::UpdatedAt, Expr::value(Utc::now()));
        for (column, value) in columns {
            update = update.col_expr(column, value);
        }

        let result = update
            .filter(attachments::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .map_err(repository_error)?;

        if result.rows_affected == 0 {
            return Err(AttachmentError::not_found(id));
        }
        Ok(())
    }
}

#[async_trait]
impl AttachmentStore for AttachmentRepository {
    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, AttachmentError> {
        let model = attachments::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(repository_error)?;

        model.map(to_domain).transpose()
    }

    async fn find_by_name(
        &self,
        name: &str,
        include_private: bool,
    ) -> Result<Option<Attachment>, AttachmentError> {
        let mut query = attachments::Entity::find().filter(
            Condition::any()
                .add(attachments::Column::Slug.eq(name))
                .add(attachments::Column::AttachedFile.eq(name))
                .add(attachments::Column::AttachedFile.like(format!("%/{}", escape_like(name)))),
        );
        if !include_private {
            query = query.filter(attachments::Column::IsPrivate.eq(false));
        }

        let model = query
            .order_by_asc(attachments::Column::Id)
            .one(&self.db)
            .await
            .map_err(repository_error)?;

        model.map(to_domain).transpose()
    }

    async fn update_path(&self, id: AttachmentId, new_path: &str) -> Result<(), AttachmentError> {
        self.update_columns(
            id,
            vec![(attachments::Column::AttachedFile, Expr::value(new_path))],
        )
        .await
    }

    async fn set_visibility(
        &self,
        id: AttachmentId,
        is_private: bool,
    ) -> Result<(), AttachmentError> {
        self.update_columns(
            id,
            vec![(attachments::Column::IsPrivate, Expr::value(is_private))],
        )
        .await
    }

    async fn list(&self, filter: &ListFilter) -> Result<PageResponse<Attachment>, AttachmentError> {
        let total = constrained(filter.visibility)
            .count(&self.db)
            .await
            .map_err(repository_error)?;

        let models = constrained(filter.visibility)
            .order_by_asc(attachments::Column::Id)
            .offset(filter.page.offset())
            .limit(filter.page.limit())
            .all(&self.db)
            .await
            .map_err(repository_error)?;

        let data = models
            .into_iter()
            .map(to_domain)
            .collect::<Result<Vec<_>, _>>()?;

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
        let result = attachments::Entity::update_many()
            .col_expr(attachments::Column::AttachedFile, Expr::value(new_path))
            .col_expr(attachments::Column::IsPrivate, Expr::value(is_private))
            .col_expr(attachments::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(attachments::Column::Id.eq(id.0))
            .filter(attachments::Column::AttachedFile.eq(expected_path))
            .exec(&self.db)
            .await
            .map_err(repository_error)?;

        if result.rows_affected > 0 {
            return Ok(true);
        }
        if self.exists(id).await? {
            debug!(attachment_id = %id, expected_path, "relocation commit lost the race");
            Ok(false)
        } else {
            Err(AttachmentError::not_found(id))
        }
    }
}

/// Base query restricted to a visibility partition.
fn constrained(visibility: VisibilityConstraint) -> Select<attachments::Entity> {
    let query = attachments::Entity::find();
    match visibility {
        VisibilityConstraint::Any => query,
        VisibilityConstraint::PublicOnly => query.filter(attachments::Column::IsPrivate.eq(false)),
        VisibilityConstraint::PrivateOnly => query.filter(attachments::Column::IsPrivate.eq(true)),
    }
}

/// Escape `LIKE` wildcards (PostgreSQL's default escape character is `\`).
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn repository_error(e: DbErr) -> AttachmentError {
    AttachmentError::repository(e.to_string())
}

/// Convert database model to domain model.
fn to_domain(model: attachments::Model) -> Result<Attachment, AttachmentError> {
    let id = AttachmentId(model.id);
    let variants: Vec<Variant> = serde_json::from_value(model.variants)
        .map_err(|e| AttachmentError::corrupt(id, format!("invalid variants: {e}")))?;

    Ok(Attachment {
        id,
        slug: model.slug,
        attached_path: model.attached_file,
        variants,
        is_private: model.is_private,
        mime_type: model.mime_type,
    })
}
