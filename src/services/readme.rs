//! README reconciliation for model folders.
//!
//! Each model folder carries a `README.md` with the shape:
//!
//! ```text
//! # {model name}
//! ## 基本信息
//! ## 模型描述
//! ## 删除信息   (only after deletion)
//! ```
//!
//! The rewrites here are line-based over the in-memory string. Sections are
//! delimited by `##` headings; untouched sections keep their bytes exactly,
//! blank lines included. Applying the same edit twice yields byte-identical
//! output on the second pass.

use chrono::{DateTime, Utc};

/// Heading of the basic-info section.
pub const SECTION_BASIC_INFO: &str = "## 基本信息";
/// Heading of the description section.
pub const SECTION_DESCRIPTION: &str = "## 模型描述";
/// Heading of the deletion-notice section.
pub const SECTION_DELETION: &str = "## 删除信息";
/// Placeholder body when no description was provided.
const NO_DESCRIPTION: &str = "暂无描述";
/// Banner line of the deletion notice.
const DELETION_BANNER: &str = "**⚠️ 该模型已被删除！**";

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Fields rendered into the initial README on upload.
pub struct ReadmeInfo<'a> {
    pub model_name: &'a str,
    pub author: &'a str,
    pub uploaded_at: DateTime<Utc>,
    pub license: Option<&'a str>,
    pub format: Option<&'a str>,
    pub tags: &'a [String],
    pub description: Option<&'a str>,
}

/// Render the initial README for a freshly uploaded model.
pub fn initial_readme(info: &ReadmeInfo<'_>) -> String {
    let mut doc = String::new();
    doc.push_str(&format!("# {}\n\n", info.model_name));

    doc.push_str(SECTION_BASIC_INFO);
    doc.push_str("\n\n");
    doc.push_str(&format!("- 作者：{}\n", info.author));
    doc.push_str(&format!("- 上传时间：{}\n", format_time(info.uploaded_at)));
    if let Some(license) = info.license.filter(|s| !s.trim().is_empty()) {
        doc.push_str(&format!("- 协议类型：{}\n", license));
    }
    if let Some(format) = info.format.filter(|s| !s.trim().is_empty()) {
        doc.push_str(&format!("- 模型格式：{}\n", format));
    }
    if !info.tags.is_empty() {
        doc.push_str(&format!("- 标签：{}\n", info.tags.join(", ")));
    }
    doc.push('\n');

    doc.push_str(SECTION_DESCRIPTION);
    doc.push_str("\n\n");
    match info.description.filter(|s| !s.trim().is_empty()) {
        Some(description) => doc.push_str(&format!("{}\n", description)),
        None => doc.push_str(&format!("{}\n", NO_DESCRIPTION)),
    }

    doc
}

fn is_section_heading(line: &str) -> bool {
    line.trim_start().starts_with("##")
}

/// Index of the next `##` heading at or after `from`, or `lines.len()`.
fn next_heading(lines: &[&str], from: usize) -> usize {
    lines[from..]
        .iter()
        .position(|l| is_section_heading(l))
        .map(|off| from + off)
        .unwrap_or(lines.len())
}

/// Replace the body of the description section with `description`.
///
/// If the section is absent it is inserted right after the basic-info
/// section, or appended at the end of the document when that section is
/// missing too. Everything outside the description section is preserved
/// byte for byte.
pub fn update_description(doc: &str, description: &str) -> String {
    if doc.is_empty() {
        return doc.to_string();
    }

    let body = match description.trim() {
        "" => NO_DESCRIPTION,
        _ => description,
    };
    let lines: Vec<&str> = doc.split('\n').collect();

    if let Some(start) = lines.iter().position(|l| l.trim() == SECTION_DESCRIPTION) {
        let end = next_heading(&lines, start + 1);

        let mut out = String::new();
        for (i, line) in lines.iter().enumerate() {
            if i == start {
                out.push_str(SECTION_DESCRIPTION);
                out.push_str("\n\n");
                out.push_str(body);
                out.push_str("\n\n");
            } else if i > start && i < end {
                // old description body
            } else {
                out.push_str(line);
                if i < lines.len() - 1 {
                    out.push('\n');
                }
            }
        }
        return out;
    }

    // No description section: insert after the basic-info section.
    let insert_after = lines
        .iter()
        .position(|l| l.trim() == SECTION_BASIC_INFO)
        .map(|start| next_heading(&lines, start + 1));

    let mut out = String::new();
    let mut inserted = false;
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line);
        if i < lines.len() - 1 {
            out.push('\n');
        }
        if !inserted && insert_after == Some(i + 1) {
            out.push_str(&format!("\n{}\n\n{}\n\n", SECTION_DESCRIPTION, body));
            inserted = true;
        }
    }
    if !inserted {
        out.push_str(&format!("\n{}\n\n{}\n", SECTION_DESCRIPTION, body));
    }

    out
}

/// Whether the document already carries a deletion notice.
///
/// Detection is by section heading, the same criterion
/// [`apply_deletion_notice`] uses for replacement, so the two can never
/// disagree about whether a notice is present.
pub fn has_deletion_notice(doc: &str) -> bool {
    doc.split('\n')
        .any(|l| l.trim().starts_with(SECTION_DELETION))
}

/// Add or refresh the deletion-notice section.
///
/// An existing notice section has its body replaced with a fresh banner and
/// timestamp; otherwise the section is appended at the end of the document.
pub fn apply_deletion_notice(doc: &str, deleted_at: DateTime<Utc>) -> String {
    if doc.is_empty() {
        return doc.to_string();
    }

    let notice = format!(
        "{}\n\n{}\n\n- 删除时间：{}\n",
        SECTION_DELETION,
        DELETION_BANNER,
        format_time(deleted_at),
    );

    let lines: Vec<&str> = doc.split('\n').collect();
    if let Some(start) = lines
        .iter()
        .position(|l| l.trim().starts_with(SECTION_DELETION))
    {
        let end = next_heading(&lines, start + 1);

        let mut out = String::new();
        for line in &lines[..start] {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&notice);
        for line in &lines[end..] {
            out.push_str(line);
            out.push('\n');
        }
        return out;
    }

    let mut out = doc.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&notice);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_info(uploaded_at: DateTime<Utc>) -> ReadmeInfo<'static> {
        ReadmeInfo {
            model_name: "ResNet50",
            author: "alice",
            uploaded_at,
            license: Some("MIT"),
            format: Some("onnx"),
            tags: &[],
            description: Some("An image classifier."),
        }
    }

    fn sample_doc() -> String {
        let at = Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap();
        let info = ReadmeInfo {
            tags: &[],
            ..sample_info(at)
        };
        initial_readme(&info)
    }

    #[test]
    fn initial_readme_has_title_and_sections() {
        let doc = sample_doc();
        assert!(doc.starts_with("# ResNet50\n\n"));
        assert!(doc.contains("## 基本信息\n\n"));
        assert!(doc.contains("- 作者：alice\n"));
        assert!(doc.contains("- 协议类型：MIT\n"));
        assert!(doc.contains("## 模型描述\n\nAn image classifier.\n"));
    }

    #[test]
    fn initial_readme_uses_placeholder_without_description() {
        let at = Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap();
        let info = ReadmeInfo {
            description: None,
            license: None,
            format: None,
            ..sample_info(at)
        };
        let doc = initial_readme(&info);
        assert!(doc.ends_with("## 模型描述\n\n暂无描述\n"));
        assert!(!doc.contains("协议类型"));
    }

    #[test]
    fn update_description_replaces_existing_section() {
        let doc = sample_doc();
        let updated = update_description(&doc, "A better classifier.");
        assert!(updated.contains("## 模型描述\n\nA better classifier.\n"));
        assert!(!updated.contains("An image classifier."));
        // basic info untouched
        assert!(updated.contains("- 作者：alice\n"));
    }

    #[test]
    fn update_description_is_idempotent() {
        let doc = sample_doc();
        let once = update_description(&doc, "New text.");
        let twice = update_description(&once, "New text.");
        assert_eq!(once, twice);
    }

    #[test]
    fn update_description_preserves_later_sections() {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let doc = apply_deletion_notice(&sample_doc(), at);
        let updated = update_description(&doc, "Edited.");
        assert!(updated.contains("## 模型描述\n\nEdited.\n"));
        assert!(updated.contains("## 删除信息"));
        assert!(updated.contains("- 删除时间：2026-02-01T00:00:00"));
    }

    #[test]
    fn update_description_inserts_after_basic_info_when_absent() {
        let doc = "# M\n\n## 基本信息\n\n- 作者：bob\n\n## 其他\n\ntext\n";
        let updated = update_description(doc, "Added.");
        let desc_pos = updated.find("## 模型描述").unwrap();
        let other_pos = updated.find("## 其他").unwrap();
        assert!(desc_pos < other_pos);
        assert!(updated.contains("## 模型描述\n\nAdded.\n"));
    }

    #[test]
    fn update_description_appends_when_no_sections() {
        let doc = "# M\n\njust a title\n";
        let updated = update_description(doc, "Tail.");
        assert!(updated.ends_with("## 模型描述\n\nTail.\n"));
    }

    #[test]
    fn blank_description_becomes_placeholder() {
        let doc = sample_doc();
        let updated = update_description(&doc, "   ");
        assert!(updated.contains("## 模型描述\n\n暂无描述\n"));
    }

    #[test]
    fn deletion_notice_appends_section() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap();
        let doc = sample_doc();
        assert!(!has_deletion_notice(&doc));

        let updated = apply_deletion_notice(&doc, at);
        assert!(has_deletion_notice(&updated));
        assert!(updated.contains("## 删除信息\n\n**⚠️ 该模型已被删除！**\n\n"));
        assert!(updated.contains("- 删除时间：2026-03-01T08:30:00\n"));
        // earlier sections intact
        assert!(updated.contains("## 模型描述\n\nAn image classifier.\n"));
    }

    #[test]
    fn deletion_notice_refreshes_existing_section() {
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap();

        let doc = apply_deletion_notice(&sample_doc(), first);
        let updated = apply_deletion_notice(&doc, second);

        assert!(updated.contains("- 删除时间：2026-04-02T09:00:00\n"));
        assert!(!updated.contains("2026-03-01T08:00:00"));
        assert_eq!(updated.matches(SECTION_DELETION).count(), 1);
    }

    #[test]
    fn detection_and_replacement_agree() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let doc = apply_deletion_notice(&sample_doc(), at);

        // The caller's skip-if-present guard uses the same heading check,
        // so a present notice is always found by both.
        assert!(has_deletion_notice(&doc));
        let replaced = apply_deletion_notice(&doc, at);
        assert_eq!(replaced.matches(DELETION_BANNER).count(), 1);
    }
}
