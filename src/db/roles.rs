//! Database operations for roles and user-role assignments.

use chrono::Utc;
use sea_orm::*;

use crate::entity::{role, user_role};
use crate::error::AppResult;

/// Find an active role by code.
pub async fn find_by_code(db: &DatabaseConnection, code: &str) -> AppResult<Option<role::Model>> {
    let result = role::Entity::find()
        .filter(role::Column::Code.eq(code))
        .filter(role::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    Ok(result)
}

/// Enabled role codes assigned to a user.
pub async fn codes_for_user(db: &DatabaseConnection, user_id: i64) -> AppResult<Vec<String>> {
    let role_ids: Vec<i64> = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|ur| ur.role_id)
        .collect();

    if role_ids.is_empty() {
        return Ok(Vec::new());
    }

    let codes = role::Entity::find()
        .filter(role::Column::Id.is_in(role_ids))
        .filter(role::Column::Enabled.eq(true))
        .filter(role::Column::DeletedAt.is_null())
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.code)
        .collect();

    Ok(codes)
}

/// Every enabled, active role, for the admin console's role picker.
pub async fn list_enabled(db: &DatabaseConnection) -> AppResult<Vec<role::Model>> {
    let rows = role::Entity::find()
        .filter(role::Column::Enabled.eq(true))
        .filter(role::Column::DeletedAt.is_null())
        .order_by_asc(role::Column::Id)
        .all(db)
        .await?;

    Ok(rows)
}

/// Assign a role to a user.
pub async fn assign(db: &DatabaseConnection, user_id: i64, role_id: i64) -> AppResult<()> {
    let active = user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    user_role::Entity::insert(active).exec(db).await?;

    Ok(())
}

/// Remove every role assignment for a user.
pub async fn clear_for_user(db: &DatabaseConnection, user_id: i64) -> AppResult<()> {
    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(())
}

/// IDs of every user holding the given role code.
pub async fn user_ids_with_code(db: &DatabaseConnection, code: &str) -> AppResult<Vec<i64>> {
    let Some(role) = find_by_code(db, code).await? else {
        return Ok(Vec::new());
    };

    let ids = user_role::Entity::find()
        .filter(user_role::Column::RoleId.eq(role.id))
        .all(db)
        .await?
        .into_iter()
        .map(|ur| ur.user_id)
        .collect();

    Ok(ids)
}
