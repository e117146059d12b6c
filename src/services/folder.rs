//! Artifact folder naming and resolution.
//!
//! Each model's files live in a folder named `model-{safe-name}-{yyyyMMdd}/`
//! inside the owner's repository. The folder path is persisted on the model
//! row at upload time; rows written by earlier releases lack it, so the
//! resolver below rediscovers the folder from remote state using three
//! strategies in priority order:
//!
//! 1. extract the folder from the stored cover-image URL,
//! 2. rebuild the canonical name from model name and creation date, falling
//!    back to a scan of root-level `model-*` directories,
//! 3. read each candidate folder's `README.md` and match on the model name.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::entity::model;
use crate::error::AppResult;
use crate::services::gitea::GiteaClient;

/// Replace characters that are unsafe or awkward in folder names.
///
/// Three passes, applied in order: filesystem-reserved characters, then
/// whitespace runs (collapsed to one underscore), then anything outside
/// `[A-Za-z0-9_-]`.
pub fn sanitize_model_name(name: &str) -> String {
    let reserved: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();

    let mut collapsed = String::with_capacity(reserved.len());
    let mut in_whitespace = false;
    for c in reserved.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                collapsed.push('_');
                in_whitespace = true;
            }
        } else {
            collapsed.push(c);
            in_whitespace = false;
        }
    }

    collapsed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Canonical folder name for a model, with trailing slash.
pub fn folder_name(model_name: &str, created_at: DateTime<Utc>) -> String {
    format!(
        "model-{}-{}/",
        sanitize_model_name(model_name),
        created_at.format("%Y%m%d"),
    )
}

/// Strategy 1: recover the folder from the stored cover-image URL.
///
/// The URL must start with the raw prefix of our own instance for the
/// `main` or `master` branch; the folder is everything up to and including
/// the last `/` before the file name.
pub fn folder_from_cover_url(cover_url: &str, main_prefix: &str, master_prefix: &str) -> Option<String> {
    let relative = cover_url
        .strip_prefix(main_prefix)
        .or_else(|| cover_url.strip_prefix(master_prefix))?;

    let last_slash = relative.rfind('/')?;
    if last_slash == 0 {
        return None;
    }

    Some(relative[..=last_slash].to_string())
}

/// Split a root directory name of the form `model-{name}-{yyyyMMdd}` into
/// its name and date parts. Returns None when the shape does not match.
fn split_folder_name(dir_name: &str) -> Option<(&str, &str)> {
    let rest = dir_name.strip_prefix("model-")?;
    let (name, date) = rest.rsplit_once('-')?;
    if date.len() == 8 && date.chars().all(|c| c.is_ascii_digit()) {
        Some((name, date))
    } else {
        None
    }
}

/// Resolve the artifact folder for a model, trying the persisted path first
/// and then the three remote fallback strategies in order.
pub async fn resolve_folder(
    gitea: &GiteaClient,
    model: &model::Model,
) -> AppResult<Option<String>> {
    if let Some(ref path) = model.folder_path {
        if !path.is_empty() {
            return Ok(Some(path.clone()));
        }
    }

    // Strategy 1: cover URL.
    if let Some(ref cover_url) = model.cover_image_url {
        let main_prefix = gitea.raw_prefix(&model.repo_name, "main");
        let master_prefix = gitea.raw_prefix(&model.repo_name, "master");
        if let Some(folder) = folder_from_cover_url(cover_url, &main_prefix, &master_prefix) {
            debug!("Resolved folder from cover URL: {}", folder);
            return Ok(Some(folder));
        }
    }

    // Strategy 2: rebuild from name and creation date.
    if let Some(folder) = find_by_name_and_date(gitea, model).await {
        debug!("Resolved folder from name and date: {}", folder);
        return Ok(Some(folder));
    }

    // Strategy 3: README content match.
    if let Some(folder) = find_by_readme(gitea, model).await {
        debug!("Resolved folder from README scan: {}", folder);
        return Ok(Some(folder));
    }

    Ok(None)
}

/// Strategy 2 body. Remote failures count as "not found" so the next
/// strategy still runs.
async fn find_by_name_and_date(gitea: &GiteaClient, model: &model::Model) -> Option<String> {
    let safe_name = sanitize_model_name(&model.name);
    let date_str = model.created_at.format("%Y%m%d").to_string();
    let expected = format!("model-{}-{}/", safe_name, date_str);

    if gitea.list_folder(&model.repo_name, &expected).await.is_ok() {
        return Some(expected);
    }

    // The canonical folder is missing; scan root directories for a
    // matching name/date pair under an older naming variant.
    let root = gitea.list_folder(&model.repo_name, "").await.ok()?;
    for entry in root {
        if !entry.is_dir() {
            continue;
        }
        if let Some((name, date)) = split_folder_name(&entry.name) {
            if name == safe_name && date == date_str {
                return Some(format!("{}/", entry.name));
            }
        }
    }

    None
}

/// Strategy 3 match: the README mentions the model name anywhere in its
/// text. A title-heading match would be subsumed by this, so one check
/// suffices.
fn readme_mentions(text: &str, name: &str) -> bool {
    text.contains(name)
}

/// Strategy 3 body: list root `model-*` directories and match each
/// `README.md` against the model name.
async fn find_by_readme(gitea: &GiteaClient, model: &model::Model) -> Option<String> {
    let root = gitea.list_folder(&model.repo_name, "").await.ok()?;

    for entry in root {
        if !entry.is_dir() || !entry.name.starts_with("model-") {
            continue;
        }
        let folder = format!("{}/", entry.name);
        let readme_path = format!("{}README.md", folder);

        match gitea.read_file(&model.repo_name, &readme_path).await {
            Ok(file) => {
                if readme_mentions(&file.text, &model.name) {
                    return Some(folder);
                }
            }
            Err(_) => {
                debug!("No readable README under {}, skipping", folder);
            }
        }
    }

    None
}

/// The model file is whatever lives in the folder besides the cover image
/// and the README.
pub async fn find_model_file(
    gitea: &GiteaClient,
    repo: &str,
    folder: &str,
) -> AppResult<Option<String>> {
    let entries = gitea.list_folder(repo, folder).await?;

    for entry in entries {
        if entry.is_file() && !entry.name.starts_with("cover-") && entry.name != "README.md" {
            return Ok(Some(format!("{}{}", folder, entry.name)));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitize_passes_safe_names_through() {
        assert_eq!(sanitize_model_name("ResNet50"), "ResNet50");
        assert_eq!(sanitize_model_name("bert-base_v2"), "bert-base_v2");
    }

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_model_name("a/b:c*d"), "a_b_c_d");
        assert_eq!(sanitize_model_name(r#"x"y<z>"#), "x_y_z_");
    }

    #[test]
    fn sanitize_collapses_whitespace_runs() {
        assert_eq!(sanitize_model_name("Res  Net \t 50"), "Res_Net_50");
    }

    #[test]
    fn sanitize_replaces_non_ascii() {
        assert_eq!(sanitize_model_name("模型A"), "__A");
    }

    #[test]
    fn folder_name_embeds_date() {
        let at = Utc.with_ymd_and_hms(2026, 1, 9, 10, 0, 0).unwrap();
        assert_eq!(folder_name("ResNet50", at), "model-ResNet50-20260109/");
        assert_eq!(folder_name("Res Net", at), "model-Res_Net-20260109/");
    }

    #[test]
    fn cover_url_extraction_matches_main_prefix() {
        let main = "http://g/acct/models-a/raw/branch/main/";
        let master = "http://g/acct/models-a/raw/branch/master/";
        let url = "http://g/acct/models-a/raw/branch/main/model-X-20260109/cover-1.png";
        assert_eq!(
            folder_from_cover_url(url, main, master),
            Some("model-X-20260109/".to_string())
        );
    }

    #[test]
    fn cover_url_extraction_falls_back_to_master() {
        let main = "http://g/acct/models-a/raw/branch/main/";
        let master = "http://g/acct/models-a/raw/branch/master/";
        let url = "http://g/acct/models-a/raw/branch/master/model-Y-20250101/cover-2.jpg";
        assert_eq!(
            folder_from_cover_url(url, main, master),
            Some("model-Y-20250101/".to_string())
        );
    }

    #[test]
    fn cover_url_extraction_rejects_foreign_urls() {
        let main = "http://g/acct/models-a/raw/branch/main/";
        let master = "http://g/acct/models-a/raw/branch/master/";
        assert_eq!(
            folder_from_cover_url("http://elsewhere/x/cover.png", main, master),
            None
        );
    }

    #[test]
    fn cover_url_extraction_needs_a_folder_segment() {
        let main = "http://g/acct/models-a/raw/branch/main/";
        let master = "http://g/acct/models-a/raw/branch/master/";
        // file sits at the repository root, no folder to extract
        assert_eq!(folder_from_cover_url("http://g/acct/models-a/raw/branch/main/cover.png", main, master), None);
    }

    #[test]
    fn readme_match_covers_titles_and_body_mentions() {
        assert!(readme_mentions("# ResNet50\n\nsome text", "ResNet50"));
        assert!(readme_mentions("mentions ResNet50 mid-sentence", "ResNet50"));
        assert!(!readme_mentions("# OtherModel\n\nnothing here", "ResNet50"));
    }

    #[test]
    fn split_folder_name_accepts_dashed_names() {
        assert_eq!(
            split_folder_name("model-bert-base-20260109"),
            Some(("bert-base", "20260109"))
        );
        assert_eq!(split_folder_name("model-X-2026"), None);
        assert_eq!(split_folder_name("data-X-20260109"), None);
    }
}
