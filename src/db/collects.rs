//! Database operations for collects (favorites).

use chrono::Utc;
use sea_orm::*;

use crate::entity::collect;
use crate::error::AppResult;

/// Active collect row for a (user, model) pair, if any.
pub async fn find_active(
    db: &DatabaseConnection,
    user_id: i64,
    model_id: i64,
) -> AppResult<Option<collect::Model>> {
    let result = collect::Entity::find()
        .filter(collect::Column::UserId.eq(user_id))
        .filter(collect::Column::ModelId.eq(model_id))
        .filter(collect::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    Ok(result)
}

/// Record a collect.
pub async fn insert(db: &DatabaseConnection, user_id: i64, model_id: i64) -> AppResult<()> {
    let active = collect::ActiveModel {
        user_id: Set(user_id),
        model_id: Set(model_id),
        created_at: Set(Utc::now()),
        deleted_at: Set(None),
        ..Default::default()
    };
    collect::Entity::insert(active).exec(db).await?;

    Ok(())
}

/// Soft-delete one collect row.
pub async fn soft_delete(db: &DatabaseConnection, row: collect::Model) -> AppResult<()> {
    let mut active: collect::ActiveModel = row.into();
    active.deleted_at = Set(Some(Utc::now()));
    active.update(db).await?;

    Ok(())
}

/// Soft-delete every active collect pointing at a model. Returns how many
/// rows were touched.
pub async fn soft_delete_for_model(db: &DatabaseConnection, model_id: i64) -> AppResult<u64> {
    let res = collect::Entity::update_many()
        .col_expr(
            collect::Column::DeletedAt,
            sea_orm::sea_query::Expr::value(Some(Utc::now())),
        )
        .filter(collect::Column::ModelId.eq(model_id))
        .filter(collect::Column::DeletedAt.is_null())
        .exec(db)
        .await?;

    Ok(res.rows_affected)
}

/// Model IDs the user has actively collected, newest collect first.
pub async fn model_ids_for_user(db: &DatabaseConnection, user_id: i64) -> AppResult<Vec<i64>> {
    let ids = collect::Entity::find()
        .filter(collect::Column::UserId.eq(user_id))
        .filter(collect::Column::DeletedAt.is_null())
        .order_by_desc(collect::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.model_id)
        .collect();

    Ok(ids)
}

/// Count of a user's active collects.
pub async fn count_for_user(db: &DatabaseConnection, user_id: i64) -> AppResult<u64> {
    let count = collect::Entity::find()
        .filter(collect::Column::UserId.eq(user_id))
        .filter(collect::Column::DeletedAt.is_null())
        .count(db)
        .await?;

    Ok(count)
}
