//! Role lookup capability.
//!
//! Handlers needing an admin check receive this capability explicitly
//! rather than reaching into global state. The hierarchy is
//! `super_admin > admin > user` and is enforced here, not by the schema.

use sea_orm::DatabaseConnection;

use crate::db;
use crate::error::{AppError, AppResult};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

#[derive(Clone)]
pub struct RoleLookup {
    db: DatabaseConnection,
}

impl RoleLookup {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Enabled role codes of a user.
    pub async fn roles_of(&self, user_id: i64) -> AppResult<Vec<String>> {
        db::roles::codes_for_user(&self.db, user_id).await
    }

    /// Whether the user holds admin or super-admin.
    pub async fn is_admin(&self, user_id: i64) -> AppResult<bool> {
        let codes = self.roles_of(user_id).await?;
        Ok(codes
            .iter()
            .any(|c| c == ROLE_ADMIN || c == ROLE_SUPER_ADMIN))
    }

    pub async fn is_super_admin(&self, user_id: i64) -> AppResult<bool> {
        let codes = self.roles_of(user_id).await?;
        Ok(codes.iter().any(|c| c == ROLE_SUPER_ADMIN))
    }

    pub async fn require_admin(&self, user_id: i64) -> AppResult<()> {
        if self.is_admin(user_id).await? {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(
                "Admin role required".to_string(),
            ))
        }
    }

    pub async fn require_super_admin(&self, user_id: i64) -> AppResult<()> {
        if self.is_super_admin(user_id).await? {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(
                "Super admin role required".to_string(),
            ))
        }
    }
}
