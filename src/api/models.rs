//! Model API handlers.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, put, web};
use futures_util::StreamExt;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{AuthUser, RoleLookup};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuditRequest, DescriptionRequest, ModelStats, ModelView, Pagination, PaginationParams,
    SourceFileResponse, SourceUpdateRequest, UploadMeta, VisibilityRequest,
};
use crate::services::model::{self, UploadedFile, Warnings};
use crate::services::{GiteaClient, stats};

/// Configure model routes.
///
/// Fixed segments (`mine`, `pending`, ...) register before the `{id}`
/// routes so they are matched first.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_model)
        .service(list_models)
        .service(list_my_models)
        .service(list_pending_models)
        .service(list_my_activities)
        .service(model_stats)
        .service(get_model)
        .service(get_model_source)
        .service(update_model_source)
        .service(update_visibility)
        .service(update_cover)
        .service(update_description)
        .service(audit_model)
        .service(delete_model);
}

/// Filters for the public and personal model listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ModelQueryParams {
    /// Keyword matched against name and description
    pub keyword: Option<String>,
    /// Tag matched against the label string
    pub tag: Option<String>,
    /// Visibility filter (personal listing only)
    pub is_public: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ModelQueryParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Paginated model list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelListResponse {
    pub models: Vec<ModelView>,
    pub pagination: Pagination,
}

/// Response for mutations whose artifact-store sync is best-effort.
#[derive(Debug, Serialize, ToSchema)]
pub struct MutationResponse {
    pub model: ModelView,
    /// Remote side effects that were skipped or failed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Like [`MutationResponse`] without a row, for deletions.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

async fn read_field_bytes(field: &mut actix_multipart::Field, max: usize) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::Validation(format!("Read error: {}", e)))?;
        if data.len() + chunk.len() > max {
            return Err(AppError::Validation(format!(
                "Upload exceeds the {} byte limit",
                max
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_field_text(field: &mut actix_multipart::Field) -> AppResult<String> {
    // form values are small; cap them well below the file limit
    let bytes = read_field_bytes(field, 64 * 1024).await?;
    String::from_utf8(bytes).map_err(|e| AppError::Validation(format!("Invalid UTF-8: {}", e)))
}

/// Read one file part, capturing its client-side file name.
async fn read_file_part(
    field: &mut actix_multipart::Field,
    max: usize,
) -> AppResult<UploadedFile> {
    let file_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Validation("File part is missing a filename".to_string()))?;

    let bytes = read_field_bytes(field, max).await?;
    Ok(UploadedFile { file_name, bytes })
}

/// Parse the multipart upload request into metadata plus file parts.
async fn parse_upload(
    mut payload: Multipart,
    max_upload_size: usize,
) -> AppResult<(UploadMeta, Option<UploadedFile>, Option<UploadedFile>)> {
    let mut meta = UploadMeta::default();
    let mut model_file = None;
    let mut cover = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation("Missing content disposition".to_string()))?;

        match name.as_str() {
            "name" => meta.name = read_field_text(&mut field).await?.trim().to_string(),
            "description" => {
                let value = read_field_text(&mut field).await?;
                if !value.trim().is_empty() {
                    meta.description = Some(value);
                }
            }
            "tags" => {
                // repeated fields and comma-joined values both accepted
                let value = read_field_text(&mut field).await?;
                meta.tags
                    .extend(value.split(',').map(|t| t.trim().to_string()));
            }
            "license" => {
                let value = read_field_text(&mut field).await?;
                if !value.trim().is_empty() {
                    meta.license = Some(value);
                }
            }
            "format" => {
                let value = read_field_text(&mut field).await?;
                if !value.trim().is_empty() {
                    meta.format = Some(value);
                }
            }
            "is_public" => {
                let value = read_field_text(&mut field).await?;
                meta.is_public = matches!(value.trim(), "1" | "true");
            }
            "file" => model_file = Some(read_file_part(&mut field, max_upload_size).await?),
            "cover" => cover = Some(read_file_part(&mut field, max_upload_size).await?),
            _ => {
                // drain unknown parts
                while let Some(chunk) = field.next().await {
                    let _ = chunk;
                }
            }
        }
    }

    Ok((meta, model_file, cover))
}

fn warnings_response(view: ModelView, warnings: Warnings) -> HttpResponse {
    HttpResponse::Ok().json(MutationResponse {
        model: view,
        warnings: warnings.into_vec(),
    })
}

/// Upload a new model (multipart: metadata fields + `file` + optional `cover`).
#[utoipa::path(
    post,
    path = "/api/v1/models",
    tag = "Models",
    responses(
        (status = 201, description = "Model uploaded", body = MutationResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 409, description = "Duplicate model name", body = crate::error::ErrorResponse),
        (status = 502, description = "Artifact store failure", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[post("/models")]
pub async fn upload_model(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    roles: web::Data<RoleLookup>,
    max_upload_size: web::Data<usize>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let (meta, model_file, cover) = parse_upload(payload, **max_upload_size).await?;
    let model_file =
        model_file.ok_or_else(|| AppError::Validation("Model file is required".to_string()))?;

    let (row, warnings) = model::upload(
        db.get_ref(),
        gitea.get_ref(),
        roles.get_ref(),
        auth.user_id,
        meta,
        model_file,
        cover,
    )
    .await?;

    let view = model::fill_view(db.get_ref(), gitea.get_ref(), row).await?;
    Ok(HttpResponse::Created().json(MutationResponse {
        model: view,
        warnings: warnings.into_vec(),
    }))
}

/// Public listing: approved public models, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/models",
    tag = "Models",
    params(ModelQueryParams),
    responses(
        (status = 200, description = "Model page", body = ModelListResponse)
    )
)]
#[get("/models")]
pub async fn list_models(
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    query: web::Query<ModelQueryParams>,
) -> AppResult<HttpResponse> {
    let params = query.pagination();
    let (rows, total) = db::models::list_public(
        db.get_ref(),
        query.keyword.as_deref(),
        query.tag.as_deref(),
        params.page(),
        params.clamped_limit(),
    )
    .await?;

    let models = model::fill_views(db.get_ref(), gitea.get_ref(), rows).await?;
    Ok(HttpResponse::Ok().json(ModelListResponse {
        models,
        pagination: Pagination::new(&params, total),
    }))
}

/// The caller's own models, every status and visibility.
#[utoipa::path(
    get,
    path = "/api/v1/models/mine",
    tag = "Models",
    params(ModelQueryParams),
    responses(
        (status = 200, description = "Model page", body = ModelListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[get("/models/mine")]
pub async fn list_my_models(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    query: web::Query<ModelQueryParams>,
) -> AppResult<HttpResponse> {
    let params = query.pagination();
    let (rows, total) = db::models::list_mine(
        db.get_ref(),
        auth.user_id,
        query.keyword.as_deref(),
        query.is_public,
        query.tag.as_deref(),
        params.page(),
        params.clamped_limit(),
    )
    .await?;

    let models = model::fill_views(db.get_ref(), gitea.get_ref(), rows).await?;
    Ok(HttpResponse::Ok().json(ModelListResponse {
        models,
        pagination: Pagination::new(&params, total),
    }))
}

/// Admin review queue: public models waiting for audit.
#[utoipa::path(
    get,
    path = "/api/v1/models/pending",
    tag = "Models",
    params(ModelQueryParams),
    responses(
        (status = 200, description = "Model page", body = ModelListResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[get("/models/pending")]
pub async fn list_pending_models(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    roles: web::Data<RoleLookup>,
    query: web::Query<ModelQueryParams>,
) -> AppResult<HttpResponse> {
    roles.require_admin(auth.user_id).await?;

    let params = query.pagination();
    let (rows, total) = db::models::list_pending(
        db.get_ref(),
        query.keyword.as_deref(),
        params.page(),
        params.clamped_limit(),
    )
    .await?;

    let models = model::fill_views(db.get_ref(), gitea.get_ref(), rows).await?;
    Ok(HttpResponse::Ok().json(ModelListResponse {
        models,
        pagination: Pagination::new(&params, total),
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityParams {
    /// Maximum number of entries (default 10)
    pub limit: Option<u64>,
}

/// The caller's recently rejected models. Rejected rows surface nowhere
/// else, so this is where an owner learns a review failed.
#[utoipa::path(
    get,
    path = "/api/v1/models/activities",
    tag = "Models",
    params(ActivityParams),
    responses(
        (status = 200, description = "Recent rejections", body = [ModelView]),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[get("/models/activities")]
pub async fn list_my_activities(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    query: web::Query<ActivityParams>,
) -> AppResult<HttpResponse> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let rows = db::models::list_rejected_for_user(db.get_ref(), auth.user_id, limit).await?;

    let models = model::fill_views(db.get_ref(), gitea.get_ref(), rows).await?;
    Ok(HttpResponse::Ok().json(models))
}

/// Site statistics. Figures degrade to zero individually when a query
/// fails; anonymous callers get zeros for the personal counters.
#[utoipa::path(
    get,
    path = "/api/v1/models/stats",
    tag = "Models",
    responses(
        (status = 200, description = "Statistics", body = ModelStats)
    )
)]
#[get("/models/stats")]
pub async fn model_stats(
    auth: Option<AuthUser>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let user_id = auth.map(|a| a.user_id);
    let (stats, _warnings) = stats::gather(db.get_ref(), user_id).await;
    Ok(HttpResponse::Ok().json(stats))
}

/// Model detail.
#[utoipa::path(
    get,
    path = "/api/v1/models/{id}",
    tag = "Models",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Model detail", body = ModelView),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    )
)]
#[get("/models/{id}")]
pub async fn get_model(
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let row = db::models::get_by_id(db.get_ref(), path.into_inner()).await?;
    let view = model::fill_view(db.get_ref(), gitea.get_ref(), row).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Read the model's source file from the artifact store.
#[utoipa::path(
    get,
    path = "/api/v1/models/{id}/source",
    tag = "Models",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Source file", body = SourceFileResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Artifact store failure", body = crate::error::ErrorResponse),
    )
)]
#[get("/models/{id}/source")]
pub async fn get_model_source(
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let source = model::read_source(db.get_ref(), gitea.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(source))
}

/// Overwrite (or create) a source file in the model's folder.
#[utoipa::path(
    put,
    path = "/api/v1/models/{id}/source",
    tag = "Models",
    params(("id" = i64, Path, description = "Model ID")),
    request_body = SourceUpdateRequest,
    responses(
        (status = 200, description = "Source updated"),
        (status = 403, description = "Not the uploader", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/models/{id}/source")]
pub async fn update_model_source(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    path: web::Path<i64>,
    body: web::Json<SourceUpdateRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    model::update_source(
        db.get_ref(),
        gitea.get_ref(),
        auth.user_id,
        path.into_inner(),
        &req.file_name,
        &req.content,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Source updated" })))
}

/// Toggle visibility. The resulting review status depends on the actor's
/// role: admins are self-trusted, plain users re-enter review when going
/// public.
#[utoipa::path(
    put,
    path = "/api/v1/models/{id}/visibility",
    tag = "Models",
    params(("id" = i64, Path, description = "Model ID")),
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Visibility updated", body = ModelView),
        (status = 403, description = "Not permitted", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/models/{id}/visibility")]
pub async fn update_visibility(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    roles: web::Data<RoleLookup>,
    path: web::Path<i64>,
    body: web::Json<VisibilityRequest>,
) -> AppResult<HttpResponse> {
    let row = model::update_visibility(
        db.get_ref(),
        roles.get_ref(),
        auth.user_id,
        path.into_inner(),
        body.is_public,
    )
    .await?;

    let view = model::fill_view(db.get_ref(), gitea.get_ref(), row).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Replace the cover image (multipart: `cover` part).
#[utoipa::path(
    put,
    path = "/api/v1/models/{id}/cover",
    tag = "Models",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Cover updated", body = ModelView),
        (status = 403, description = "Not the uploader", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/models/{id}/cover")]
pub async fn update_cover(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    max_upload_size: web::Data<usize>,
    path: web::Path<i64>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut cover = None;
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(|s| s.to_string());
        if name.as_deref() == Some("cover") {
            cover = Some(read_file_part(&mut field, **max_upload_size).await?);
        } else {
            while let Some(chunk) = field.next().await {
                let _ = chunk;
            }
        }
    }
    let cover = cover.ok_or_else(|| AppError::Validation("Cover image is required".to_string()))?;

    let row = model::update_cover(
        db.get_ref(),
        gitea.get_ref(),
        auth.user_id,
        path.into_inner(),
        cover,
    )
    .await?;

    let view = model::fill_view(db.get_ref(), gitea.get_ref(), row).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Update the description and best-effort sync the README section.
#[utoipa::path(
    put,
    path = "/api/v1/models/{id}/description",
    tag = "Models",
    params(("id" = i64, Path, description = "Model ID")),
    request_body = DescriptionRequest,
    responses(
        (status = 200, description = "Description updated", body = MutationResponse),
        (status = 403, description = "Not the uploader", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/models/{id}/description")]
pub async fn update_description(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    path: web::Path<i64>,
    body: web::Json<DescriptionRequest>,
) -> AppResult<HttpResponse> {
    let model_id = path.into_inner();
    let warnings = model::update_description(
        db.get_ref(),
        gitea.get_ref(),
        auth.user_id,
        model_id,
        body.into_inner().description,
    )
    .await?;

    let row = db::models::get_by_id(db.get_ref(), model_id).await?;
    let view = model::fill_view(db.get_ref(), gitea.get_ref(), row).await?;
    Ok(warnings_response(view, warnings))
}

/// Record an admin audit decision: approve publishes, reject unpublishes.
#[utoipa::path(
    put,
    path = "/api/v1/models/{id}/audit",
    tag = "Models",
    params(("id" = i64, Path, description = "Model ID")),
    request_body = AuditRequest,
    responses(
        (status = 200, description = "Audit recorded", body = ModelView),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/models/{id}/audit")]
pub async fn audit_model(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    roles: web::Data<RoleLookup>,
    path: web::Path<i64>,
    body: web::Json<AuditRequest>,
) -> AppResult<HttpResponse> {
    let row = model::audit(
        db.get_ref(),
        roles.get_ref(),
        auth.user_id,
        path.into_inner(),
        body.approved,
    )
    .await?;

    let view = model::fill_view(db.get_ref(), gitea.get_ref(), row).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Soft-delete a model and cascade its collects. The shared repository is
/// never deleted.
#[utoipa::path(
    delete,
    path = "/api/v1/models/{id}",
    tag = "Models",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Model deleted", body = DeleteResponse),
        (status = 403, description = "Not permitted", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[delete("/models/{id}")]
pub async fn delete_model(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    gitea: web::Data<GiteaClient>,
    roles: web::Data<RoleLookup>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let warnings = model::delete(
        db.get_ref(),
        gitea.get_ref(),
        roles.get_ref(),
        auth.user_id,
        path.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: "Model deleted".to_string(),
        warnings: warnings.into_vec(),
    }))
}
