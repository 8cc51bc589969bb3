use std::fs;
use std::path::Path;

use colored::Colorize;

use super::{checked_out_branch, initialized_workspace};
use crate::branch_key::sanitize;
use crate::error::Result;
use crate::prune::prune as prune_orphans;
use crate::sync::{list_archived_branches, list_branches};
use crate::CLI_NAME;

/// `bctx branches list`
pub fn list(cwd: &Path) -> Result<()> {
    let ws = initialized_workspace(cwd)?;
    let keys = list_branches(&ws);

    if keys.is_empty() {
        println!("No branch contexts yet");
        return Ok(());
    }

    let current = checked_out_branch(&ws).map(|b| sanitize(&b));

    println!("Branch contexts ({}):\n", keys.len());
    for key in &keys {
        let files = fs::read_dir(ws.branches_dir().join(key))
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
                    .count()
            })
            .unwrap_or(0);

        if current.as_deref() == Some(key.as_str()) {
            println!("  {} {} ({} files)", "*".green(), key.green(), files);
        } else {
            println!("    {key} ({files} files)");
        }
    }

    let archived = list_archived_branches(&ws);
    if !archived.is_empty() {
        println!("\nArchived: {}", archived.len());
    }
    Ok(())
}

/// `bctx branches prune`
pub fn prune(cwd: &Path) -> Result<()> {
    let ws = initialized_workspace(cwd)?;
    let archived = prune_orphans(&ws)?;

    if archived.is_empty() {
        println!("No orphan contexts to prune");
        return Ok(());
    }

    println!("Archived {} orphan contexts:\n", archived.len());
    for key in &archived {
        println!("  {key}");
    }
    println!("\nDone. Use '{CLI_NAME} branches list' to see current contexts.");
    Ok(())
}
