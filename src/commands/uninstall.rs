use std::path::Path;

use colored::Colorize;

use crate::error::{Error, Result};
use crate::hooks::{uninstall_hook, HookKind, HookUninstall};
use crate::{git, CLI_NAME};

/// `bctx uninstall [--global]`
///
/// Contexts and templates stay on disk; only the hooks go.
pub fn uninstall(cwd: &Path, global: bool) -> Result<()> {
    if global {
        if git::config_unset(cwd, "core.hooksPath", true) {
            println!("Global hooks path unset");
        } else {
            println!("Global hooks path was not set");
        }
        return Ok(());
    }

    let root = git::git_root(cwd).ok_or(Error::NotGitRepo)?;

    let mut any_found = false;
    for kind in HookKind::ALL {
        match uninstall_hook(&root, kind)? {
            HookUninstall::Uninstalled => {
                any_found = true;
                println!("{} {kind}", "Hook removed:".green());
            }
            HookUninstall::NotManaged => {
                any_found = true;
                println!("{} {kind} hook exists but not managed by {CLI_NAME}", "warning:".yellow());
            }
            HookUninstall::NotInstalled => {}
        }
    }

    if !any_found {
        println!("No hooks installed");
    }
    Ok(())
}
