//! Database operations for models.

use chrono::Utc;
use sea_orm::*;

use crate::entity::model;
use crate::error::{AppError, AppResult};
use crate::services::moderation::ReviewStatus;

/// Fields captured at upload time.
pub struct NewModel {
    pub name: String,
    pub description: Option<String>,
    pub user_id: i64,
    pub repo_name: String,
    pub repo_url: Option<String>,
    pub folder_path: Option<String>,
    pub cover_image_url: Option<String>,
    pub label_names: Option<String>,
    pub attr_format: Option<String>,
    pub attr_license: Option<String>,
    pub is_public: bool,
    pub status: i16,
}

/// Find an active model by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> AppResult<Option<model::Model>> {
    let result = model::Entity::find_by_id(id)
        .filter(model::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    Ok(result)
}

/// Find an active model by ID, or fail with NotFound.
pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> AppResult<model::Model> {
    find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Model {}", id)))
}

/// Whether the user already owns an active model with this name.
pub async fn name_exists_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    name: &str,
) -> AppResult<bool> {
    let count = model::Entity::find()
        .filter(model::Column::UserId.eq(user_id))
        .filter(model::Column::Name.eq(name))
        .filter(model::Column::DeletedAt.is_null())
        .count(db)
        .await?;

    Ok(count > 0)
}

/// Insert a new model and return the stored row.
pub async fn insert(db: &DatabaseConnection, new: NewModel) -> AppResult<model::Model> {
    let now = Utc::now();
    let active = model::ActiveModel {
        name: Set(new.name),
        description: Set(new.description),
        user_id: Set(new.user_id),
        repo_name: Set(new.repo_name),
        repo_url: Set(new.repo_url),
        folder_path: Set(new.folder_path),
        cover_image_url: Set(new.cover_image_url),
        label_names: Set(new.label_names),
        attr_format: Set(new.attr_format),
        attr_license: Set(new.attr_license),
        is_public: Set(new.is_public),
        status: Set(new.status),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };

    let res = model::Entity::insert(active).exec(db).await?;

    find_by_id(db, res.last_insert_id)
        .await?
        .ok_or_else(|| AppError::Database("Failed to fetch newly inserted model".to_string()))
}

fn keyword_condition(keyword: Option<&str>) -> Option<Condition> {
    keyword.filter(|k| !k.trim().is_empty()).map(|kw| {
        Condition::any()
            .add(model::Column::Name.contains(kw))
            .add(model::Column::Description.contains(kw))
    })
}

/// Public listing: approved, public models, newest first, with optional
/// keyword match on name/description and tag match on the label string.
pub async fn list_public(
    db: &DatabaseConnection,
    keyword: Option<&str>,
    tag: Option<&str>,
    page: u64,
    limit: u64,
) -> AppResult<(Vec<model::Model>, u64)> {
    let mut query = model::Entity::find()
        .filter(model::Column::DeletedAt.is_null())
        .filter(model::Column::IsPublic.eq(true))
        .filter(model::Column::Status.eq(ReviewStatus::Approved.code()));

    if let Some(cond) = keyword_condition(keyword) {
        query = query.filter(cond);
    }
    if let Some(tag) = tag.filter(|t| !t.trim().is_empty()) {
        query = query.filter(model::Column::LabelNames.contains(tag));
    }

    let paginator = query
        .order_by_desc(model::Column::CreatedAt)
        .paginate(db, limit);

    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

    Ok((rows, total))
}

/// Active models owned by a user, newest first, with the same filters as
/// the public listing plus an optional visibility filter.
pub async fn list_mine(
    db: &DatabaseConnection,
    user_id: i64,
    keyword: Option<&str>,
    is_public: Option<bool>,
    tag: Option<&str>,
    page: u64,
    limit: u64,
) -> AppResult<(Vec<model::Model>, u64)> {
    let mut query = model::Entity::find()
        .filter(model::Column::DeletedAt.is_null())
        .filter(model::Column::UserId.eq(user_id));

    if let Some(cond) = keyword_condition(keyword) {
        query = query.filter(cond);
    }
    if let Some(public) = is_public {
        query = query.filter(model::Column::IsPublic.eq(public));
    }
    if let Some(tag) = tag.filter(|t| !t.trim().is_empty()) {
        query = query.filter(model::Column::LabelNames.contains(tag));
    }

    let paginator = query
        .order_by_desc(model::Column::CreatedAt)
        .paginate(db, limit);

    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

    Ok((rows, total))
}

/// Review queue: public models awaiting audit, newest first.
pub async fn list_pending(
    db: &DatabaseConnection,
    keyword: Option<&str>,
    page: u64,
    limit: u64,
) -> AppResult<(Vec<model::Model>, u64)> {
    let mut query = model::Entity::find()
        .filter(model::Column::DeletedAt.is_null())
        .filter(model::Column::IsPublic.eq(true))
        .filter(model::Column::Status.eq(ReviewStatus::Pending.code()));

    if let Some(cond) = keyword_condition(keyword) {
        query = query.filter(cond);
    }

    let paginator = query
        .order_by_desc(model::Column::CreatedAt)
        .paginate(db, limit);

    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

    Ok((rows, total))
}

/// A user's recently rejected models, most recently updated first. Feeds
/// the owner's activity view; rejected rows appear nowhere else.
pub async fn list_rejected_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> AppResult<Vec<model::Model>> {
    let rows = model::Entity::find()
        .filter(model::Column::DeletedAt.is_null())
        .filter(model::Column::UserId.eq(user_id))
        .filter(model::Column::Status.eq(ReviewStatus::Rejected.code()))
        .order_by_desc(model::Column::UpdatedAt)
        .limit(limit)
        .all(db)
        .await?;

    Ok(rows)
}

/// Count of active, approved, public models.
pub async fn count_public(db: &DatabaseConnection) -> AppResult<u64> {
    let count = model::Entity::find()
        .filter(model::Column::DeletedAt.is_null())
        .filter(model::Column::IsPublic.eq(true))
        .filter(model::Column::Status.eq(ReviewStatus::Approved.code()))
        .count(db)
        .await?;

    Ok(count)
}

/// Count of active models owned by a user.
pub async fn count_for_user(db: &DatabaseConnection, user_id: i64) -> AppResult<u64> {
    let count = model::Entity::find()
        .filter(model::Column::DeletedAt.is_null())
        .filter(model::Column::UserId.eq(user_id))
        .count(db)
        .await?;

    Ok(count)
}

/// Apply an already-validated field update and bump `updated_at`.
pub async fn update(
    db: &DatabaseConnection,
    mut active: model::ActiveModel,
) -> AppResult<model::Model> {
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    Ok(updated)
}

/// Soft-delete a model.
pub async fn soft_delete(db: &DatabaseConnection, id: i64) -> AppResult<()> {
    let existing = get_by_id(db, id).await?;

    let mut active: model::ActiveModel = existing.into();
    active.deleted_at = Set(Some(Utc::now()));
    active.update(db).await?;

    Ok(())
}
