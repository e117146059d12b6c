//! Migration: Create roles and user_roles tables, seed the three roles.

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
                CREATE TABLE roles (
                    id BIGSERIAL PRIMARY KEY,
                    code VARCHAR(50) NOT NULL
                        CHECK (code IN ('user', 'admin', 'super_admin')),
                    name VARCHAR(100) NOT NULL,
                    enabled BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE UNIQUE INDEX idx_roles_code_active
                    ON roles(code)
                    WHERE deleted_at IS NULL;

                CREATE TABLE user_roles (
                    id BIGSERIAL PRIMARY KEY,
                    user_id BIGINT NOT NULL REFERENCES users(id),
                    role_id BIGINT NOT NULL REFERENCES roles(id),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_user_roles_user_id ON user_roles(user_id);
                CREATE INDEX idx_user_roles_role_id ON user_roles(role_id);

                INSERT INTO roles (code, name) VALUES
                    ('user', 'User'),
                    ('admin', 'Administrator'),
                    ('super_admin', 'Super Administrator');
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
                DROP TABLE IF EXISTS user_roles CASCADE;
                DROP TABLE IF EXISTS roles CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
