//! Attachments migration.
//!
//! Creates the attachments table holding file locations and visibility.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ATTACHMENTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS attachments CASCADE;")
            .await?;
        Ok(())
    }
}

const ATTACHMENTS_SQL: &str = r"
-- Attachments: primary file path relative to the upload root plus derived variants
CREATE TABLE attachments (
    id BIGSERIAL PRIMARY KEY,
    slug VARCHAR(255) NOT NULL,
    attached_file TEXT NOT NULL DEFAULT '',
    mime_type VARCHAR(255) NOT NULL DEFAULT 'application/octet-stream',
    variants JSONB NOT NULL DEFAULT '[]'::jsonb,
    is_private BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_variants_array CHECK (jsonb_typeof(variants) = 'array')
);

-- Lookup by name
CREATE INDEX idx_attachments_slug ON attachments(slug);

-- Listings partitioned by visibility
CREATE INDEX idx_attachments_public ON attachments(id) WHERE is_private = false;
CREATE INDEX idx_attachments_private ON attachments(id) WHERE is_private = true;
";
