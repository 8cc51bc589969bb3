//! Handlers behind each `bctx` subcommand.
//!
//! Handlers print their own output and return `Err` for anything that should
//! end the process with `error: …` and exit status 1.

mod base;
mod branches;
mod hook_events;
mod init;
mod status;
mod sync;
mod template;
mod uninstall;

use std::path::Path;

use tracing::debug;

pub use base::base;
pub use branches::{list, prune};
pub use hook_events::{on_checkout, on_commit};
pub use init::init;
pub use status::status;
pub use sync::sync;
pub use template::template;
pub use uninstall::uninstall;

use crate::base_branch::get_base_branch;
use crate::branch_key::sanitize;
use crate::config::Workspace;
use crate::error::{Error, Result};
use crate::git;
use crate::meta::{create_branch_meta, update_branch_meta};
use crate::tags::{update_context_tags, TagUpdate};

/// Workspace for `cwd`, which must be initialized.
fn initialized_workspace(cwd: &Path) -> Result<Workspace> {
    let ws = Workspace::discover(cwd)?;
    ws.require_initialized()?;
    Ok(ws)
}

/// The checked-out branch, `None` on a detached HEAD.
fn checked_out_branch(ws: &Workspace) -> Option<String> {
    git::current_branch(ws.root()).filter(|b| b != "HEAD")
}

fn require_branch(ws: &Workspace) -> Result<String> {
    checked_out_branch(ws).ok_or(Error::NoCurrentBranch)
}

/// Refresh the metadata of `branch` and the tags in its context.
///
/// Returns the base branch used and the tags that changed.
fn refresh_branch(ws: &Workspace, branch: &str) -> Result<(String, Vec<TagUpdate>)> {
    let key = sanitize(branch);
    let branch_dir = ws.branch_dir(branch);
    let base = get_base_branch(ws, &branch_dir);

    create_branch_meta(ws, &key, branch)?;
    update_branch_meta(ws, &key, &base)?;

    let updates = if branch_dir.is_dir() {
        update_context_tags(ws, &branch_dir, &key, &base)?
    } else {
        Vec::new()
    };
    debug!(branch, base, updates = updates.len(), "refreshed branch");
    Ok((base, updates))
}

/// `path` relative to the repository root when possible.
fn display_path(ws: &Workspace, path: &Path) -> String {
    path.strip_prefix(ws.root())
        .unwrap_or(path)
        .display()
        .to_string()
}
