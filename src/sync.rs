//! Branch context lifecycle
//!
//! `absent → created (from template | empty) → synced … → archived`
//!
//! A context is a directory under `.bctx/branches/<key>`. The root symlink
//! points at exactly one of them; switching branches moves the pointer and
//! never touches directory contents.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::base_branch::{get_base_branch, init_base_branch, save_base_branch};
use crate::branch_key::sanitize;
use crate::config::{list_dirs, Workspace, ARCHIVED_DIR, BRANCHES_DIR, CONFIG_DIR, DEFAULT_TEMPLATE};
use crate::error::{IoContext, Result};
use crate::meta::{archive_branch_meta, create_branch_meta};
use crate::sound;
use crate::template::{render, template_variables};

/// What [`create_branch_context`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The directory was already there; nothing changed.
    Exists,
    CreatedFromTemplate,
    /// No usable template; the context holds only `base_branch`.
    CreatedEmpty,
}

/// What [`reset_branch_context`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Reset,
    /// Nothing was deleted.
    TemplateNotFound,
}

/// What [`update_symlink`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymlinkUpdate {
    Unchanged,
    Updated,
    /// A real file or directory sits at the symlink path; it was left alone.
    ErrorNotSymlink,
}

/// Result of [`sync_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub branch: String,
    pub branch_dir: PathBuf,
    pub create: CreateOutcome,
    pub symlink: SymlinkUpdate,
    pub symlink_path: PathBuf,
}

pub fn branch_context_exists(ws: &Workspace, branch: &str) -> bool {
    ws.branch_dir(branch).exists()
}

/// Symlink target for `branch`, relative to the repository root.
pub fn branch_rel_path(branch: &str) -> PathBuf {
    Path::new(CONFIG_DIR).join(BRANCHES_DIR).join(sanitize(branch))
}

/// Pick the template directory for `branch`.
///
/// An explicit name must exist. An implicit choice (prefix rule or default)
/// falls back to `_default`. `None` when nothing usable exists.
fn resolve_template_dir(ws: &Workspace, branch: &str, template: Option<&str>) -> Option<PathBuf> {
    let (name, explicit) = match template {
        Some(name) => (name, true),
        None => (ws.config.template_for_branch(branch), false),
    };

    let dir = ws.template_dir(name);
    if dir.is_dir() {
        return Some(dir);
    }
    if explicit {
        return None;
    }

    let fallback = ws.template_dir(DEFAULT_TEMPLATE);
    fallback.is_dir().then_some(fallback)
}

fn render_into(ws: &Workspace, template_dir: &Path, branch_dir: &Path, branch: &str) -> Result<()> {
    let vars = template_variables(ws.root(), branch);
    render(template_dir, branch_dir, &vars)
}

/// Create the context for `branch` if it does not exist yet.
///
/// A new context gets a metadata record and a pinned base branch before the
/// template is rendered in. An explicitly named template that does not exist
/// yields an empty context here; only [`reset_branch_context`] reports it.
pub fn create_branch_context(ws: &Workspace, branch: &str, template: Option<&str>) -> Result<CreateOutcome> {
    let branch_dir = ws.branch_dir(branch);
    if branch_dir.exists() {
        return Ok(CreateOutcome::Exists);
    }

    fs::create_dir_all(&branch_dir).at(&branch_dir)?;
    create_branch_meta(ws, &sanitize(branch), branch)?;
    init_base_branch(ws, &branch_dir)?;

    match resolve_template_dir(ws, branch, template) {
        Some(template_dir) => {
            render_into(ws, &template_dir, &branch_dir, branch)?;
            info!(branch, template = %template_dir.display(), "created branch context");
            Ok(CreateOutcome::CreatedFromTemplate)
        }
        None => {
            info!(branch, "created empty branch context");
            Ok(CreateOutcome::CreatedEmpty)
        }
    }
}

/// Throw away the context of `branch` and re-render it from a template.
///
/// The template is resolved first; if that fails nothing on disk changes.
/// The pinned base branch survives the reset.
pub fn reset_branch_context(ws: &Workspace, branch: &str, template: Option<&str>) -> Result<ResetOutcome> {
    let Some(template_dir) = resolve_template_dir(ws, branch, template) else {
        return Ok(ResetOutcome::TemplateNotFound);
    };

    let branch_dir = ws.branch_dir(branch);
    let base = get_base_branch(ws, &branch_dir);
    if branch_dir.exists() {
        fs::remove_dir_all(&branch_dir).at(&branch_dir)?;
    }

    fs::create_dir_all(&branch_dir).at(&branch_dir)?;
    create_branch_meta(ws, &sanitize(branch), branch)?;
    save_base_branch(&branch_dir, &base)?;
    render_into(ws, &template_dir, &branch_dir, branch)?;
    info!(branch, template = %template_dir.display(), "reset branch context");
    Ok(ResetOutcome::Reset)
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Point the root symlink at the context of `branch`, creating the context if needed.
pub fn update_symlink(ws: &Workspace, branch: &str) -> Result<SymlinkUpdate> {
    if !branch_context_exists(ws, branch) {
        create_branch_context(ws, branch, None)?;
    }

    let link = ws.symlink_path();
    let target = branch_rel_path(branch);

    match fs::symlink_metadata(&link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            if fs::read_link(&link).at(&link)? == target {
                return Ok(SymlinkUpdate::Unchanged);
            }
            fs::remove_file(&link).at(&link)?;
        }
        Ok(_) => return Ok(SymlinkUpdate::ErrorNotSymlink),
        Err(_) => {}
    }

    make_symlink(&target, &link).at(&link)?;
    debug!(link = %link.display(), target = %target.display(), "symlink updated");
    Ok(SymlinkUpdate::Updated)
}

/// Ensure the context of `branch` exists and the root symlink points at it.
///
/// Single entry point for `bctx sync`, `bctx init` and the post-checkout hook.
pub fn sync_branch(ws: &Workspace, branch: &str) -> Result<SyncResult> {
    let create = create_branch_context(ws, branch, None)?;
    let symlink = update_symlink(ws, branch)?;

    if ws.config.sound {
        sound::play(ws.config.sound_file.as_deref().map(Path::new));
    }

    Ok(SyncResult {
        branch: branch.to_string(),
        branch_dir: ws.branch_dir(branch),
        create,
        symlink,
        symlink_path: PathBuf::from(&ws.config.symlink),
    })
}

/// Branch keys with a live context, sorted. Excludes hidden entries and the archive.
pub fn list_branches(ws: &Workspace) -> Vec<String> {
    list_dirs(&ws.branches_dir())
        .into_iter()
        .filter(|name| name != ARCHIVED_DIR)
        .collect()
}

/// Branch keys with an archived context, sorted.
pub fn list_archived_branches(ws: &Workspace) -> Vec<String> {
    list_dirs(&ws.archived_dir())
}

/// First unused directory name for `key` under `archived_dir`.
fn free_archive_name(archived_dir: &Path, key: &str) -> String {
    if !archived_dir.join(key).exists() {
        return key.to_string();
    }
    let stamped = format!("{key}-{}", Local::now().format("%Y%m%d%H%M%S"));
    if !archived_dir.join(&stamped).exists() {
        return stamped;
    }
    (2..)
        .map(|n| format!("{stamped}-{n}"))
        .find(|name| !archived_dir.join(name).exists())
        .unwrap_or(stamped)
}

/// Move the context directory `key` into the archive, then its metadata record.
///
/// Returns `false` when there is no such context. An earlier archive under the
/// same key is kept by suffixing the new directory with a timestamp (and a
/// counter if that is taken too). The metadata record is filed under the
/// archived directory's name.
pub fn archive_branch(ws: &Workspace, key: &str) -> Result<bool> {
    if key.is_empty() || key == ARCHIVED_DIR || key.contains(['/', '\\']) {
        return Ok(false);
    }

    let src = ws.branches_dir().join(key);
    if !src.is_dir() {
        return Ok(false);
    }

    let archived_dir = ws.archived_dir();
    fs::create_dir_all(&archived_dir).at(&archived_dir)?;

    let archived_key = free_archive_name(&archived_dir, key);
    let dst = archived_dir.join(&archived_key);

    fs::rename(&src, &dst).at(&src)?;
    archive_branch_meta(ws, key, &archived_key)?;
    info!(key, dest = %dst.display(), "archived branch context");
    Ok(true)
}
