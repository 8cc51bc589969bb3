use std::path::Path;

use colored::Colorize;

use super::{initialized_workspace, refresh_branch, require_branch};
use crate::base_branch::{get_base_branch, save_base_branch};
use crate::error::Result;
use crate::sync::sync_branch;

/// `bctx base [ref]`: show or change the base branch of the current context.
pub fn base(cwd: &Path, new_base: Option<&str>) -> Result<()> {
    let ws = initialized_workspace(cwd)?;
    let branch = require_branch(&ws)?;
    let branch_dir = ws.branch_dir(&branch);

    let Some(new_base) = new_base.map(str::trim).filter(|b| !b.is_empty()) else {
        println!("{}", get_base_branch(&ws, &branch_dir));
        return Ok(());
    };

    if !branch_dir.is_dir() {
        sync_branch(&ws, &branch)?;
    }
    save_base_branch(&branch_dir, new_base)?;
    let (_, updates) = refresh_branch(&ws, &branch)?;

    println!("{} base of '{branch}' to {new_base}", "Set".green());
    if !updates.is_empty() {
        println!("Updated {} tag(s)", updates.len());
    }
    Ok(())
}
