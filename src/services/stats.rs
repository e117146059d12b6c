//! Read-only site statistics.
//!
//! Each figure degrades to zero independently when its query fails; a
//! broken counter must not take down the dashboard. Failures are logged
//! and reported as warnings so callers can observe degraded mode.

use sea_orm::DatabaseConnection;

use crate::db;
use crate::models::ModelStats;
use crate::services::model::Warnings;

/// Gather site statistics for an optionally authenticated caller. The
/// per-user figures are zero for anonymous callers.
pub async fn gather(db: &DatabaseConnection, user_id: Option<i64>) -> (ModelStats, Warnings) {
    let mut stats = ModelStats::default();
    let mut warnings = Warnings::default();

    match db::models::count_public(db).await {
        Ok(count) => stats.total_count = count,
        Err(e) => warnings.push(format!("Total model count unavailable: {}", e)),
    }

    if let Some(user_id) = user_id {
        match db::models::count_for_user(db, user_id).await {
            Ok(count) => stats.my_upload_count = count,
            Err(e) => warnings.push(format!("Upload count unavailable: {}", e)),
        }
        match db::collects::count_for_user(db, user_id).await {
            Ok(count) => stats.my_collect_count = count,
            Err(e) => warnings.push(format!("Collect count unavailable: {}", e)),
        }
    }

    match db::visits::count(db).await {
        Ok(count) => stats.visit_count = count,
        Err(e) => warnings.push(format!("Visit count unavailable: {}", e)),
    }

    (stats, warnings)
}
