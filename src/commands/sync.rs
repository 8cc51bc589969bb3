use std::path::Path;

use colored::Colorize;

use super::{display_path, initialized_workspace, refresh_branch, require_branch};
use crate::error::Result;
use crate::sync::{sync_branch, CreateOutcome, SymlinkUpdate};

/// `bctx sync`: point the symlink at the current branch and refresh it.
pub fn sync(cwd: &Path) -> Result<()> {
    let ws = initialized_workspace(cwd)?;
    let branch = require_branch(&ws)?;

    let result = sync_branch(&ws, &branch)?;
    let (base, updates) = refresh_branch(&ws, &branch)?;

    let context = display_path(&ws, &result.branch_dir);
    println!("{}  {}", "Branch:".bold(), result.branch);
    println!("{} {}", "Context:".bold(), context);
    println!("{} {} -> {}", "Symlink:".bold(), result.symlink_path.display(), context);
    println!("{}    {}", "Base:".bold(), base);

    let status = match result.create {
        CreateOutcome::CreatedFromTemplate => "created from template",
        CreateOutcome::CreatedEmpty => "created (no template)",
        CreateOutcome::Exists => "synced",
    };
    println!("{}  {}", "Status:".bold(), status);

    if !updates.is_empty() {
        println!("{} {} tag(s)", "Updated:".bold(), updates.len());
    }

    if result.symlink == SymlinkUpdate::ErrorNotSymlink {
        println!(
            "{} {} exists but is not a symlink; left untouched",
            "warning:".yellow(),
            result.symlink_path.display()
        );
    }

    Ok(())
}
