//! Favorite (collect) endpoints.

use actix_web::{HttpResponse, delete, get, post, web};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::{ModelView, Pagination, PaginationParams};
use crate::services::GiteaClient;
use crate::services::model;

/// Configure collect routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(collect_model)
        .service(uncollect_model)
        .service(check_collected)
        .service(list_collected);
}

/// Paginated collected-model list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectListResponse {
    pub models: Vec<ModelView>,
    pub pagination: Pagination,
}

/// Collect (favorite) a model.
#[utoipa::path(
    post,
    path = "/api/v1/models/{id}/collect",
    tag = "Collects",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Model collected"),
        (status = 404, description = "Model not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already collected", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[post("/models/{id}/collect")]
pub async fn collect_model(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let model_id = path.into_inner();
    let model = db::models::get_by_id(db.get_ref(), model_id).await?;

    if db::collects::find_active(db.get_ref(), auth.user_id, model_id)
        .await?
        .is_some()
    {
        return Err(AppError::Duplicate(format!(
            "Model '{}' is already collected",
            model.name
        )));
    }

    db::collects::insert(db.get_ref(), auth.user_id, model_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Model collected" })))
}

/// Remove a model from the caller's favorites.
#[utoipa::path(
    delete,
    path = "/api/v1/models/{id}/collect",
    tag = "Collects",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Collect removed"),
        (status = 404, description = "Not collected", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[delete("/models/{id}/collect")]
pub async fn uncollect_model(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let model_id = path.into_inner();
    let row = db::collects::find_active(db.get_ref(), auth.user_id, model_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Collect for model {}", model_id)))?;

    db::collects::soft_delete(db.get_ref(), row).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Collect removed" })))
}

/// Whether the caller has collected a model.
#[utoipa::path(
    get,
    path = "/api/v1/models/{id}/collect",
    tag = "Collects",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Collect state"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[get("/models/{id}/collect")]
pub async fn check_collected(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let model_id = path.into_inner();
    let collected = db::collects::find_active(db.get_ref(), auth.user_id, model_id)
        .await?
        .is_some();

    Ok(HttpResponse::Ok().json(serde_json::json!({ "collected": collected })))
}

/// The caller's collected models, newest collect first. Models deleted
/// since collection are silently skipped.
#[utoipa::path(
    get,
    path = "/api/v1/collects",
    tag = "Collects",
    params(PaginationParams),
    responses(
        (status = 200, description = "Collected models", body = CollectListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[get("/collects")]
pub async fn list_collected(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    let ids = db::collects::model_ids_for_user(db.get_ref(), auth.user_id).await?;
    let total = ids.len() as u64;

    let limit = query.clamped_limit();
    let page_ids = ids
        .into_iter()
        .skip(query.offset(limit))
        .take(limit as usize);

    let mut rows = Vec::new();
    for id in page_ids {
        match db::models::find_by_id(db.get_ref(), id).await? {
            Some(row) => rows.push(row),
            // cascade normally clears these; a leftover is not an error
            None => warn!("Collected model {} no longer exists", id),
        }
    }

    let models = model::fill_views(db.get_ref(), gitea.get_ref(), rows).await?;
    Ok(HttpResponse::Ok().json(CollectListResponse {
        models,
        pagination: Pagination::new(&query, total),
    }))
}
