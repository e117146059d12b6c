//! Database operations for visit logs.

use chrono::Utc;
use sea_orm::*;

use crate::entity::visit_log;
use crate::error::AppResult;

/// Record one visit (successful login).
pub async fn record(db: &DatabaseConnection, user_id: i64) -> AppResult<()> {
    let active = visit_log::ActiveModel {
        user_id: Set(user_id),
        logged_in_at: Set(Utc::now()),
        ..Default::default()
    };
    visit_log::Entity::insert(active).exec(db).await?;

    Ok(())
}

/// Total number of recorded visits.
pub async fn count(db: &DatabaseConnection) -> AppResult<u64> {
    let count = visit_log::Entity::find().count(db).await?;

    Ok(count)
}
