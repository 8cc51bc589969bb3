//! Per-context base branch.
//!
//! Each branch context pins the ref it is compared against in a `base_branch`
//! file, written when the context is created. Changing `default_base_branch`
//! later only affects contexts created afterwards.

use std::fs;
use std::path::Path;

use crate::config::Workspace;
use crate::error::{IoContext, Result};

pub const BASE_BRANCH_FILE: &str = "base_branch";

/// The pinned base branch of `branch_dir`, else the workspace default.
pub fn get_base_branch(ws: &Workspace, branch_dir: &Path) -> String {
    match fs::read_to_string(branch_dir.join(BASE_BRANCH_FILE)) {
        Ok(contents) => contents.trim().to_string(),
        Err(_) => ws.config.default_base_branch.clone(),
    }
}

/// Create or overwrite the `base_branch` file.
pub fn save_base_branch(branch_dir: &Path, base: &str) -> Result<()> {
    let path = branch_dir.join(BASE_BRANCH_FILE);
    fs::write(&path, format!("{base}\n")).at(path)
}

/// Pin the workspace default unless a base branch is already recorded.
pub fn init_base_branch(ws: &Workspace, branch_dir: &Path) -> Result<()> {
    if branch_dir.join(BASE_BRANCH_FILE).exists() {
        return Ok(());
    }
    save_base_branch(branch_dir, &ws.config.default_base_branch)
}
