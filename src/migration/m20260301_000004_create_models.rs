//! Migration: Create models table.
//!
//! `folder_path` is nullable: rows uploaded before the path was persisted
//! are located through the fallback folder resolver.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE models (
                    id BIGSERIAL PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    description TEXT,
                    user_id BIGINT NOT NULL REFERENCES users(id),
                    repo_name VARCHAR(255) NOT NULL,
                    repo_url VARCHAR(500),
                    folder_path VARCHAR(500),
                    cover_image_url VARCHAR(500),
                    label_names VARCHAR(500),
                    attr_format VARCHAR(100),
                    attr_license VARCHAR(100),
                    is_public BOOLEAN NOT NULL DEFAULT FALSE,
                    status SMALLINT NOT NULL DEFAULT 0
                        CHECK (status IN (0, 10, 20, 30)),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE INDEX idx_models_user_id
                    ON models(user_id)
                    WHERE deleted_at IS NULL;

                -- Public listing reads approved + public rows ordered by creation
                CREATE INDEX idx_models_listing
                    ON models(status, is_public, created_at DESC)
                    WHERE deleted_at IS NULL;

                CREATE TRIGGER update_models_updated_at
                    BEFORE UPDATE ON models
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_models_updated_at ON models;
                DROP TABLE IF EXISTS models CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
