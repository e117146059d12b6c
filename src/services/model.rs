//! Model lifecycle workflows: upload, mutation, deletion.
//!
//! Database metadata is the system of record; the artifact store holds the
//! files plus a denormalized README. README synchronization is best-effort
//! by design: a failed remote write never rolls back the primary database
//! mutation, it is reported back as a warning instead.

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::RoleLookup;
use crate::db;
use crate::entity::model;
use crate::error::{AppError, AppResult};
use crate::models::{ModelView, SourceFileResponse, UploadMeta};
use crate::services::folder;
use crate::services::gitea::GiteaClient;
use crate::services::moderation;
use crate::services::readme::{self, ReadmeInfo};

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Warnings collected along a best-effort path. The primary mutation has
/// already succeeded when these are returned; each entry names one remote
/// side effect that was skipped or failed.
#[derive(Debug, Default)]
pub struct Warnings(Vec<String>);

impl Warnings {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.0.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Language tag inferred from a model file name, if any.
fn detect_language_tag(file_name: &str) -> Option<&'static str> {
    let lower = file_name.to_lowercase();
    let ext = lower.rsplit('.').next()?;
    match ext {
        "py" => Some("python"),
        "java" => Some("java"),
        "jl" => Some("julia"),
        "mo" => Some("modelica"),
        "m" => Some("matlab"),
        "slx" | "mdl" => Some("simulink"),
        "c" | "cpp" | "cc" | "cxx" | "h" | "hpp" => Some("c/c++"),
        _ => None,
    }
}

/// Merge user-chosen tags with the auto-detected language tag into the
/// stored comma-joined label string.
fn build_label_names(tags: &[String], model_file_name: &str) -> Option<String> {
    let mut labels: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if !trimmed.is_empty() && !labels.iter().any(|l| l == trimmed) {
            labels.push(trimmed.to_string());
        }
    }
    if let Some(auto) = detect_language_tag(model_file_name) {
        if !labels.iter().any(|l| l == auto) {
            labels.push(auto.to_string());
        }
    }

    if labels.is_empty() {
        None
    } else {
        Some(labels.join(","))
    }
}

fn cover_file_name(original: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    match original.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("cover-{}.{}", uuid, ext),
        _ => format!("cover-{}", uuid),
    }
}

/// Fill the view fields not stored on the row: author display name and the
/// default cover for rows without one.
pub async fn fill_view(
    db: &DatabaseConnection,
    gitea: &GiteaClient,
    row: model::Model,
) -> AppResult<ModelView> {
    let mut view = ModelView::from(row);

    if let Some(user) = db::users::find_by_id(db, view.user_id).await? {
        view.author_name = Some(user.nickname.unwrap_or(user.username));
    }
    if view
        .cover_image_url
        .as_deref()
        .is_none_or(|url| url.trim().is_empty())
    {
        view.cover_image_url = Some(gitea.default_cover_url());
    }

    Ok(view)
}

pub async fn fill_views(
    db: &DatabaseConnection,
    gitea: &GiteaClient,
    rows: Vec<model::Model>,
) -> AppResult<Vec<ModelView>> {
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(fill_view(db, gitea, row).await?);
    }
    Ok(views)
}

/// Upload a new model: ensure the owner's repository, write the model file,
/// optional cover and README into a fresh dated folder, then persist the
/// metadata row with the folder path and derived review status.
pub async fn upload(
    db: &DatabaseConnection,
    gitea: &GiteaClient,
    roles: &RoleLookup,
    user_id: i64,
    meta: UploadMeta,
    model_file: UploadedFile,
    cover: Option<UploadedFile>,
) -> AppResult<(model::Model, Warnings)> {
    if meta.name.trim().is_empty() {
        return Err(AppError::Validation("Model name is required".to_string()));
    }
    if model_file.bytes.is_empty() {
        return Err(AppError::Validation("Model file is required".to_string()));
    }

    let user = db::users::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
    let display_name = user.nickname.clone().unwrap_or_else(|| user.username.clone());

    if db::models::name_exists_for_user(db, user_id, &meta.name).await? {
        // Folder names derive from (name, date); a same-day duplicate would
        // collide inside the repository.
        return Err(AppError::Duplicate(format!(
            "Model '{}' already exists",
            meta.name
        )));
    }

    let repo_name = format!("models-{}", user.username);
    let repo_desc = format!("Model repository for {}", display_name);
    gitea.ensure_repository(&repo_name, &repo_desc).await?;

    let created_at = Utc::now();
    let model_folder = folder::folder_name(&meta.name, created_at);
    info!("Uploading model '{}' into {}", meta.name, model_folder);

    let model_file_path = format!("{}{}", model_folder, model_file.file_name);
    gitea
        .upload_binary(&repo_name, &model_file_path, &model_file.bytes)
        .await?;

    let mut cover_image_url = None;
    if let Some(ref cover) = cover {
        let cover_path = format!("{}{}", model_folder, cover_file_name(&cover.file_name));
        gitea
            .upload_binary(&repo_name, &cover_path, &cover.bytes)
            .await?;
        cover_image_url = Some(gitea.download_url(&repo_name, &cover_path));
    }

    let mut warnings = Warnings::default();
    let readme_doc = readme::initial_readme(&ReadmeInfo {
        model_name: &meta.name,
        author: &display_name,
        uploaded_at: created_at,
        license: meta.license.as_deref(),
        format: meta.format.as_deref(),
        tags: &meta.tags,
        description: meta.description.as_deref(),
    });
    let readme_path = format!("{}README.md", model_folder);
    if let Err(e) = gitea.upload_text(&repo_name, &readme_path, &readme_doc).await {
        warnings.push(format!("README upload failed: {}", e));
    }

    let uploader_is_admin = roles.is_admin(user_id).await?;
    let status = moderation::status_on_upload(meta.is_public, uploader_is_admin);

    let row = db::models::insert(
        db,
        db::models::NewModel {
            label_names: build_label_names(&meta.tags, &model_file.file_name),
            name: meta.name,
            description: meta.description,
            user_id,
            repo_url: Some(gitea.archive_url(&repo_name)),
            repo_name,
            folder_path: Some(model_folder),
            cover_image_url,
            attr_format: meta.format,
            attr_license: meta.license,
            is_public: meta.is_public,
            status: status.code(),
        },
    )
    .await?;

    info!("Model uploaded: id={}, status={:?}", row.id, status);

    Ok((row, warnings))
}

/// Toggle visibility. Owners may toggle their own models; a super admin may
/// toggle anyone's. The new review status follows the actor's role.
pub async fn update_visibility(
    db: &DatabaseConnection,
    roles: &RoleLookup,
    actor_id: i64,
    model_id: i64,
    is_public: bool,
) -> AppResult<model::Model> {
    let row = db::models::get_by_id(db, model_id).await?;

    if row.user_id != actor_id && !roles.is_super_admin(actor_id).await? {
        return Err(AppError::PermissionDenied(
            "Cannot change another user's model".to_string(),
        ));
    }

    let actor_is_admin = roles.is_admin(actor_id).await?;
    let status = moderation::status_on_visibility_change(is_public, actor_is_admin);

    let mut active: model::ActiveModel = row.into();
    active.is_public = Set(is_public);
    active.status = Set(status.code());
    let updated = db::models::update(db, active).await?;

    info!(
        "Visibility updated: id={}, public={}, status={:?}",
        model_id, is_public, status
    );

    Ok(updated)
}

/// Record an admin audit decision.
pub async fn audit(
    db: &DatabaseConnection,
    roles: &RoleLookup,
    actor_id: i64,
    model_id: i64,
    approved: bool,
) -> AppResult<model::Model> {
    roles.require_admin(actor_id).await?;

    let row = db::models::get_by_id(db, model_id).await?;
    let (status, is_public) = moderation::audit_outcome(approved);

    let mut active: model::ActiveModel = row.into();
    active.status = Set(status.code());
    active.is_public = Set(is_public);
    let updated = db::models::update(db, active).await?;

    info!("Model audited: id={}, approved={}", model_id, approved);

    Ok(updated)
}

/// Update the stored description, then best-effort sync the README's
/// description section.
pub async fn update_description(
    db: &DatabaseConnection,
    gitea: &GiteaClient,
    actor_id: i64,
    model_id: i64,
    description: String,
) -> AppResult<Warnings> {
    let row = db::models::get_by_id(db, model_id).await?;
    if row.user_id != actor_id {
        return Err(AppError::PermissionDenied(
            "Only the uploader can edit this model".to_string(),
        ));
    }

    let mut active: model::ActiveModel = row.clone().into();
    active.description = Set(Some(description.clone()));
    db::models::update(db, active).await?;

    let mut warnings = Warnings::default();
    match folder::resolve_folder(gitea, &row).await {
        Ok(Some(model_folder)) => {
            let readme_path = format!("{}README.md", model_folder);
            match gitea.read_file(&row.repo_name, &readme_path).await {
                Ok(stored) => {
                    let updated = readme::update_description(&stored.text, &description);
                    let message = format!("Update description: {}", row.name);
                    if let Err(e) = gitea
                        .update_file(&row.repo_name, &readme_path, &updated, &stored.sha, &message)
                        .await
                    {
                        warnings.push(format!("README update failed: {}", e));
                    }
                }
                Err(e) => warnings.push(format!("README read failed: {}", e)),
            }
        }
        Ok(None) => warnings.push(format!(
            "Cannot determine artifact folder for model {}, README not synced",
            model_id
        )),
        Err(e) => warnings.push(format!("Folder resolution failed: {}", e)),
    }

    Ok(warnings)
}

/// Replace the cover image. Unlike README sync this is the primary effect
/// of the request, so remote failures surface as errors.
pub async fn update_cover(
    db: &DatabaseConnection,
    gitea: &GiteaClient,
    actor_id: i64,
    model_id: i64,
    cover: UploadedFile,
) -> AppResult<model::Model> {
    if cover.bytes.is_empty() {
        return Err(AppError::Validation("Cover image is required".to_string()));
    }

    let row = db::models::get_by_id(db, model_id).await?;
    if row.user_id != actor_id {
        return Err(AppError::PermissionDenied(
            "Only the uploader can edit this model".to_string(),
        ));
    }

    let model_folder = folder::resolve_folder(gitea, &row)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Artifact folder for model {}", model_id))
        })?;

    let cover_path = format!("{}{}", model_folder, cover_file_name(&cover.file_name));
    gitea
        .upload_binary(&row.repo_name, &cover_path, &cover.bytes)
        .await?;
    let cover_url = gitea.download_url(&row.repo_name, &cover_path);

    let mut active: model::ActiveModel = row.into();
    active.cover_image_url = Set(Some(cover_url));
    let updated = db::models::update(db, active).await?;

    info!("Cover updated: id={}", model_id);

    Ok(updated)
}

/// Soft-delete a model: cascade its collects, then best-effort mark the
/// README with a deletion notice. The repository itself is shared by the
/// owner's other models and is never deleted.
pub async fn delete(
    db: &DatabaseConnection,
    gitea: &GiteaClient,
    roles: &RoleLookup,
    actor_id: i64,
    model_id: i64,
) -> AppResult<Warnings> {
    let row = db::models::get_by_id(db, model_id).await?;

    if row.user_id != actor_id && !roles.is_super_admin(actor_id).await? {
        return Err(AppError::PermissionDenied(
            "Cannot delete another user's model".to_string(),
        ));
    }

    db::models::soft_delete(db, model_id).await?;

    let mut warnings = Warnings::default();
    match db::collects::soft_delete_for_model(db, model_id).await {
        Ok(count) if count > 0 => info!("Cascaded {} collect rows for model {}", count, model_id),
        Ok(_) => {}
        Err(e) => warnings.push(format!("Collect cascade failed: {}", e)),
    }

    match folder::resolve_folder(gitea, &row).await {
        Ok(Some(model_folder)) => {
            let readme_path = format!("{}README.md", model_folder);
            match gitea.read_file(&row.repo_name, &readme_path).await {
                Ok(stored) if readme::has_deletion_notice(&stored.text) => {
                    info!("README already carries a deletion notice, skipping");
                }
                Ok(stored) => {
                    let updated = readme::apply_deletion_notice(&stored.text, Utc::now());
                    let message = format!("Mark model as deleted: {}", row.name);
                    if let Err(e) = gitea
                        .update_file(&row.repo_name, &readme_path, &updated, &stored.sha, &message)
                        .await
                    {
                        warnings.push(format!("README deletion notice failed: {}", e));
                    }
                }
                Err(e) => warnings.push(format!("README read failed: {}", e)),
            }
        }
        Ok(None) => warnings.push(format!(
            "Cannot determine artifact folder for model {}, README not updated",
            model_id
        )),
        Err(e) => warnings.push(format!("Folder resolution failed: {}", e)),
    }

    info!("Model deleted: id={}", model_id);

    Ok(warnings)
}

/// Read the model's source file: whatever sits in the folder besides the
/// cover and the README.
pub async fn read_source(
    db: &DatabaseConnection,
    gitea: &GiteaClient,
    model_id: i64,
) -> AppResult<SourceFileResponse> {
    let row = db::models::get_by_id(db, model_id).await?;

    let model_folder = folder::resolve_folder(gitea, &row)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Artifact folder for model {}", model_id))
        })?;

    let file_path = folder::find_model_file(gitea, &row.repo_name, &model_folder)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Model file for model {}", model_id)))?;

    let stored = gitea.read_file(&row.repo_name, &file_path).await?;
    let file_name = file_path
        .strip_prefix(&model_folder)
        .unwrap_or(&file_path)
        .to_string();

    Ok(SourceFileResponse {
        file_name,
        content: stored.text,
    })
}

/// Overwrite (or create) a source file inside the model's folder.
pub async fn update_source(
    db: &DatabaseConnection,
    gitea: &GiteaClient,
    actor_id: i64,
    model_id: i64,
    file_name: &str,
    content: &str,
) -> AppResult<()> {
    if file_name.trim().is_empty() || file_name.contains('/') {
        return Err(AppError::Validation("Invalid file name".to_string()));
    }

    let row = db::models::get_by_id(db, model_id).await?;
    if row.user_id != actor_id {
        return Err(AppError::PermissionDenied(
            "Only the uploader can edit this model".to_string(),
        ));
    }

    let model_folder = folder::resolve_folder(gitea, &row)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Artifact folder for model {}", model_id))
        })?;
    let file_path = format!("{}{}", model_folder, file_name);

    // An existing file needs its SHA for the update; a missing one is
    // created fresh.
    match gitea.read_file(&row.repo_name, &file_path).await {
        Ok(stored) => {
            let message = format!("Update source: {}", row.name);
            gitea
                .update_file(&row.repo_name, &file_path, content, &stored.sha, &message)
                .await?;
        }
        Err(AppError::Remote { status: 404, .. }) => {
            gitea.upload_text(&row.repo_name, &file_path, content).await?;
        }
        Err(e) => return Err(e),
    }

    let active: model::ActiveModel = row.into();
    db::models::update(db, active).await?;

    info!("Source updated: id={}, file={}", model_id, file_name);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_tag_from_extension() {
        assert_eq!(detect_language_tag("net.py"), Some("python"));
        assert_eq!(detect_language_tag("Sim.SLX"), Some("simulink"));
        assert_eq!(detect_language_tag("kernel.cxx"), Some("c/c++"));
        assert_eq!(detect_language_tag("weights.onnx"), None);
        assert_eq!(detect_language_tag("no-extension"), None);
    }

    #[test]
    fn label_names_merge_user_tags_and_auto_tag() {
        let tags = vec!["vision".to_string(), " cnn ".to_string()];
        assert_eq!(
            build_label_names(&tags, "resnet.py"),
            Some("vision,cnn,python".to_string())
        );
    }

    #[test]
    fn label_names_deduplicate() {
        let tags = vec!["python".to_string(), "python".to_string()];
        assert_eq!(
            build_label_names(&tags, "train.py"),
            Some("python".to_string())
        );
    }

    #[test]
    fn label_names_empty_when_nothing_applies() {
        assert_eq!(build_label_names(&[], "weights.bin"), None);
        assert_eq!(build_label_names(&["  ".to_string()], "weights.bin"), None);
    }

    #[test]
    fn cover_file_name_keeps_extension() {
        let name = cover_file_name("photo.PNG");
        assert!(name.starts_with("cover-"));
        assert!(name.ends_with(".PNG"));

        let bare = cover_file_name("photo");
        assert!(bare.starts_with("cover-"));
        assert!(!bare.contains('.'));
    }
}
