//! Context tag substitution
//!
//! Context files can embed live git data between tag pairs:
//!
//! ```text
//! ## Commits
//! <bctx:commits>
//! a1b2c3d Add login form
//! </bctx:commits>
//!
//! ## Files
//! <bctx:files>
//! A  src/login.rs  (+120 -0)
//! </bctx:files>
//! ```
//!
//! Only the text between an opening tag and the nearest closing tag of the
//! same name is replaced. Content is opaque text, never parsed as markup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Workspace;
use crate::error::{IoContext, Result};
use crate::meta::get_branch_meta;

pub const TAG_COMMITS: &str = "bctx:commits";
pub const TAG_FILES: &str = "bctx:files";

/// Files scanned for tags.
pub const CONTEXT_FILE_EXTENSIONS: &[&str] = &["md", "txt"];

/// One rewritten tag region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUpdate {
    pub file: PathBuf,
    pub tag: &'static str,
    /// Previous inner content, trimmed
    pub old_content: String,
    pub new_content: String,
}

/// Lazy, multi-line, same-name pairing. The regex crate has no backreferences,
/// so each tag name gets its own alternative.
fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<bctx:commits>(?P<commits>.*?)</bctx:commits>|<bctx:files>(?P<files>.*?)</bctx:files>")
            .expect("tag pattern is valid")
    })
}

/// Shown in place of empty data, e.g. a branch with no commits past its base.
pub fn sync_message(base_branch: &str) -> String {
    format!("N/A - in sync with {base_branch}")
}

/// All `(tag, inner content)` pairs in `content`, in order.
pub fn find_tags(content: &str) -> Vec<(&'static str, String)> {
    tag_re()
        .captures_iter(content)
        .filter_map(|caps| match (caps.name("commits"), caps.name("files")) {
            (Some(m), _) => Some((TAG_COMMITS, m.as_str().to_string())),
            (_, Some(m)) => Some((TAG_FILES, m.as_str().to_string())),
            _ => None,
        })
        .collect()
}

/// Every `.md` / `.txt` file under `context_dir`, sorted. Missing dir → empty.
pub fn find_context_files(context_dir: &Path) -> Vec<PathBuf> {
    if !context_dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(context_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| CONTEXT_FILE_EXTENSIONS.contains(&ext))
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Rewrite every tag region in `content`.
///
/// Returns the new content and one `(tag, old, new)` triple per region.
pub fn substitute_tags(
    content: &str,
    commits: &str,
    files: &str,
) -> (String, Vec<(&'static str, String, String)>) {
    let mut seen = Vec::new();
    let replaced = tag_re().replace_all(content, |caps: &Captures| {
        let (tag, old, value) = match (caps.name("commits"), caps.name("files")) {
            (Some(m), _) => (TAG_COMMITS, m.as_str(), commits),
            (_, Some(m)) => (TAG_FILES, m.as_str(), files),
            _ => return caps[0].to_string(),
        };
        seen.push((tag, old.trim().to_string(), value.to_string()));
        format!("<{tag}>\n{value}\n</{tag}>")
    });
    (replaced.into_owned(), seen)
}

/// Refresh tag regions in every context file under `context_dir`.
///
/// Missing metadata, or an empty field, renders as [`sync_message`]. Files are
/// only written when their content actually changes, so a second run with no
/// new commits returns no updates and leaves every byte in place.
pub fn update_context_tags(
    ws: &Workspace,
    context_dir: &Path,
    branch_key: &str,
    base_branch: &str,
) -> Result<Vec<TagUpdate>> {
    let fallback = sync_message(base_branch);
    let meta = get_branch_meta(ws, branch_key);
    let pick = |value: Option<&String>| match value {
        Some(v) if !v.is_empty() => v.clone(),
        _ => fallback.clone(),
    };
    let commits = pick(meta.as_ref().map(|m| &m.commits));
    let files = pick(meta.as_ref().map(|m| &m.changed_files));

    let mut updates = Vec::new();
    for path in find_context_files(context_dir) {
        let original = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable context file");
                continue;
            }
        };

        let (rewritten, regions) = substitute_tags(&original, &commits, &files);
        if regions.is_empty() || rewritten == original {
            continue;
        }

        fs::write(&path, &rewritten).at(&path)?;
        debug!(path = %path.display(), regions = regions.len(), "rewrote context tags");
        updates.extend(regions.into_iter().map(|(tag, old_content, new_content)| TagUpdate {
            file: path.clone(),
            tag,
            old_content,
            new_content,
        }));
    }
    Ok(updates)
}
