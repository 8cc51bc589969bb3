//! Entry points called by the installed git hooks.
//!
//! Both run on every checkout or commit, so they stay quiet and never fail
//! a repository that has not been set up.

use std::path::Path;

use colored::Colorize;
use tracing::debug;

use super::{checked_out_branch, display_path, refresh_branch};
use crate::config::Workspace;
use crate::error::{Error, Result};
use crate::git;
use crate::sync::{sync_branch, CreateOutcome, SymlinkUpdate};

/// `bctx on-checkout <old> <new>`, run by `post-checkout`.
pub fn on_checkout(cwd: &Path, old_branch: &str, new_branch: &str) -> Result<()> {
    let root = git::git_root(cwd).ok_or(Error::NotGitRepo)?;
    let ws = Workspace::open(root);

    if !ws.is_initialized() {
        println!("Branch: {old_branch} -> {new_branch}");
        return Ok(());
    }
    if new_branch == "HEAD" || new_branch.is_empty() {
        debug!("detached HEAD, nothing to sync");
        return Ok(());
    }

    let result = sync_branch(&ws, new_branch)?;
    refresh_branch(&ws, new_branch)?;

    let status = if result.create == CreateOutcome::Exists {
        "synced"
    } else {
        "new"
    };
    println!("Branch: {old_branch} -> {new_branch} ({status})");

    if result.symlink == SymlinkUpdate::ErrorNotSymlink {
        println!(
            "{} {} exists but is not a symlink; left untouched",
            "warning:".yellow(),
            result.symlink_path.display()
        );
    }
    Ok(())
}

/// `bctx on-commit`, run by `post-commit`.
pub fn on_commit(cwd: &Path) -> Result<()> {
    let root = git::git_root(cwd).ok_or(Error::NotGitRepo)?;
    let ws = Workspace::open(root);

    if !ws.is_initialized() {
        return Ok(());
    }
    let Some(branch) = checked_out_branch(&ws) else {
        return Ok(());
    };

    let (_, updates) = refresh_branch(&ws, &branch)?;
    if !updates.is_empty() {
        println!("Updated {} tag(s) in context files:", updates.len());
        for update in &updates {
            println!("  {}: <{}>", display_path(&ws, &update.file), update.tag);
        }
    }
    Ok(())
}
