//! Model entity: one uploaded artifact.
//!
//! `repo_name` is stable per owning user (one Gitea repository per user,
//! shared by all their models). `folder_path` is the artifact folder within
//! that repository; it is nullable because rows created by earlier versions
//! never stored it and rely on the fallback resolver.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "models")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub user_id: i64,
    pub repo_name: String,
    /// Archive (zip) download URL for the owning repository
    pub repo_url: Option<String>,
    /// Artifact folder inside the repository, with trailing slash
    pub folder_path: Option<String>,
    pub cover_image_url: Option<String>,
    /// Comma-joined tag names
    pub label_names: Option<String>,
    pub attr_format: Option<String>,
    pub attr_license: Option<String>,
    pub is_public: bool,
    /// Review status: 0 initial, 10 pending, 20 approved, 30 rejected
    pub status: i16,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
