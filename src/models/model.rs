//! Model request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity;

/// A model row as returned by the API.
///
/// `author_name` and a default cover image are filled in by the service
/// layer; they are not stored on the row itself.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModelView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub user_id: i64,
    pub author_name: Option<String>,
    pub repo_name: String,
    pub repo_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub label_names: Option<String>,
    pub attr_format: Option<String>,
    pub attr_license: Option<String>,
    pub is_public: bool,
    /// Review status code: 0 initial, 10 pending, 20 approved, 30 rejected
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<entity::model::Model> for ModelView {
    fn from(m: entity::model::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            user_id: m.user_id,
            author_name: None,
            repo_name: m.repo_name,
            repo_url: m.repo_url,
            cover_image_url: m.cover_image_url,
            label_names: m.label_names,
            attr_format: m.attr_format,
            attr_license: m.attr_license,
            is_public: m.is_public,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Metadata fields of a multipart model upload.
///
/// The files themselves (model file, optional cover) are carried as
/// separate multipart parts.
#[derive(Debug, Default)]
pub struct UploadMeta {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub license: Option<String>,
    pub format: Option<String>,
    pub is_public: bool,
}

/// Visibility toggle request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

/// Admin audit request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuditRequest {
    pub approved: bool,
}

/// Description update request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DescriptionRequest {
    pub description: String,
}

/// Source file content response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SourceFileResponse {
    pub file_name: String,
    pub content: String,
}

/// Source file update request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SourceUpdateRequest {
    pub file_name: String,
    pub content: String,
}

/// Site statistics. Each figure independently degrades to zero when its
/// underlying query fails.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ModelStats {
    pub total_count: u64,
    pub my_upload_count: u64,
    pub my_collect_count: u64,
    pub visit_count: u64,
}
