//! Database operations for users.

use chrono::Utc;
use sea_orm::*;

use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::UserQueryParams;

/// Find an active user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> AppResult<Option<user::Model>> {
    let result = user::Entity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    Ok(result)
}

/// Find an active user by username.
pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> AppResult<Option<user::Model>> {
    let result = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    Ok(result)
}

/// Find an active user by email.
pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> AppResult<Option<user::Model>> {
    let result = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    Ok(result)
}

/// Insert a new user and return the stored row.
pub async fn insert(
    db: &DatabaseConnection,
    username: &str,
    password_hash: &str,
    nickname: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> AppResult<user::Model> {
    let now = Utc::now();
    let active = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash.to_string()),
        nickname: Set(nickname.map(|s| s.to_string())),
        email: Set(email.map(|s| s.to_string())),
        phone: Set(phone.map(|s| s.to_string())),
        avatar_url: Set(None),
        enabled: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };

    let res = user::Entity::insert(active).exec(db).await?;

    find_by_id(db, res.last_insert_id)
        .await?
        .ok_or_else(|| AppError::Database("Failed to fetch newly inserted user".to_string()))
}

/// Set the enabled flag.
pub async fn set_enabled(db: &DatabaseConnection, id: i64, enabled: bool) -> AppResult<()> {
    let existing = find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

    let mut active: user::ActiveModel = existing.into();
    active.enabled = Set(enabled);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    Ok(())
}

/// Soft-delete a user.
pub async fn soft_delete(db: &DatabaseConnection, id: i64) -> AppResult<()> {
    let existing = find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

    let mut active: user::ActiveModel = existing.into();
    active.deleted_at = Set(Some(Utc::now()));
    active.update(db).await?;

    Ok(())
}

/// List every active user matching the admin filters, excluding the given
/// IDs, in creation order.
///
/// Role rank is not a column, so the handler resolves roles, rank-orders
/// the full set and only then cuts the requested page. Paginating here
/// would pin each row to a page before its rank is known.
pub async fn list_filtered(
    db: &DatabaseConnection,
    params: &UserQueryParams,
    exclude_ids: &[i64],
) -> AppResult<Vec<user::Model>> {
    let mut query = user::Entity::find().filter(user::Column::DeletedAt.is_null());

    if !exclude_ids.is_empty() {
        query = query.filter(user::Column::Id.is_not_in(exclude_ids.to_vec()));
    }
    if let Some(ref username) = params.username {
        query = query.filter(user::Column::Username.contains(username));
    }
    if let Some(ref nickname) = params.nickname {
        query = query.filter(user::Column::Nickname.contains(nickname));
    }
    if let Some(ref email) = params.email {
        query = query.filter(user::Column::Email.contains(email));
    }
    if let Some(enabled) = params.enabled {
        query = query.filter(user::Column::Enabled.eq(enabled));
    }

    let rows = query.order_by_asc(user::Column::CreatedAt).all(db).await?;

    Ok(rows)
}

/// Profile fields a user may change on their own account. `None` leaves a
/// field untouched; the nullable fields use an inner Option so a blank
/// submission can clear them.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
}

/// Apply profile changes and return the updated row.
pub async fn update_profile(
    db: &DatabaseConnection,
    user: user::Model,
    changes: ProfileChanges,
) -> AppResult<user::Model> {
    let mut active: user::ActiveModel = user.into();
    if let Some(nickname) = changes.nickname {
        active.nickname = Set(Some(nickname));
    }
    if let Some(email) = changes.email {
        active.email = Set(Some(email));
    }
    if let Some(phone) = changes.phone {
        active.phone = Set(phone);
    }
    if let Some(avatar_url) = changes.avatar_url {
        active.avatar_url = Set(avatar_url);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    Ok(updated)
}

/// Replace a user's password hash.
pub async fn set_password_hash(
    db: &DatabaseConnection,
    id: i64,
    password_hash: &str,
) -> AppResult<()> {
    let existing = find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

    let mut active: user::ActiveModel = existing.into();
    active.password_hash = Set(password_hash.to_string());
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    Ok(())
}
