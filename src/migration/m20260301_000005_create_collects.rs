//! Migration: Create collects (favorites) table.

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
                CREATE TABLE collects (
                    id BIGSERIAL PRIMARY KEY,
                    user_id BIGINT NOT NULL REFERENCES users(id),
                    model_id BIGINT NOT NULL REFERENCES models(id),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                -- At most one active collect per (user, model)
                CREATE UNIQUE INDEX idx_collects_user_model_active
                    ON collects(user_id, model_id)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_collects_model_id
                    ON collects(model_id)
                    WHERE deleted_at IS NULL;
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS collects CASCADE;")
            .await?;

        Ok(())
    }
}
