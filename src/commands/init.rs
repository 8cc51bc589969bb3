//! `bctx init` creates the config, a default template and the git hooks,
//! then syncs the current branch.

use std::fs;
use std::path::Path;

use colored::Colorize;

use super::{checked_out_branch, display_path, refresh_branch};
use crate::config::{Config, Workspace, BRANCHES_DIR, CONFIG_DIR, DEFAULT_TEMPLATE};
use crate::error::{Error, IoContext, Result};
use crate::hooks::{install_hook, HookInstall, HookKind};
use crate::sync::sync_branch;
use crate::{git, CLI_NAME};

/// Default template, rendered into every new context
const DEFAULT_CONTEXT_MD: &str = r#"# {{branch}}

Started {{date}} by {{author}}.

## Goal

## Notes

## Commits
<bctx:commits>
</bctx:commits>

## Changed files
<bctx:files>
</bctx:files>
"#;

/// Initialize branchctx in the repository containing `cwd`
pub fn init(cwd: &Path) -> Result<()> {
    let root = git::git_root(cwd).ok_or(Error::NotGitRepo)?;
    let ws = Workspace::open(&root);
    let already_initialized = ws.is_initialized();

    if !already_initialized {
        println!("\n{}", "Initializing branch contexts...".cyan().bold());
        println!("   Repository: {}\n", root.display());

        create_dir_if_missing(&ws, &ws.config_dir())?;
        create_dir_if_missing(&ws, &ws.branches_dir())?;
        create_dir_if_missing(&ws, &ws.template_dir(DEFAULT_TEMPLATE))?;

        Config::default().save(&root)?;
        println!("   {} {}", "Creating".green(), display_path(&ws, &ws.config_path()));

        let context_path = ws.template_dir(DEFAULT_TEMPLATE).join("context.md");
        write_file_if_missing(&ws, &context_path, DEFAULT_CONTEXT_MD)?;
    }

    // Reload so a fresh config.json is the one in effect
    let ws = Workspace::open(&root);

    for kind in HookKind::ALL {
        match install_hook(&root, kind)? {
            HookInstall::Installed => println!("   {} {kind} hook", "Installed".green()),
            HookInstall::Appended => println!("   {} {kind} hook (appended to existing)", "Updated".green()),
            HookInstall::AlreadyInstalled => {
                println!("   {} {kind} hook (already installed)", "Skipping".yellow())
            }
        }
    }

    add_to_gitignore(&root, &ws.config.symlink)?;
    add_to_gitignore(&root, &format!("{CONFIG_DIR}/{BRANCHES_DIR}/"))?;

    if let Some(branch) = checked_out_branch(&ws) {
        sync_branch(&ws, &branch)?;
        refresh_branch(&ws, &branch)?;
        println!("   {} {branch}", "Synced".green());
    }

    if already_initialized {
        println!("\n{}", "Already initialized".green().bold());
    } else {
        println!("\n{}", "Branch contexts initialized!".green().bold());
        println!("\nNext steps:");
        println!("  1. Edit templates in {}", format!("{CONFIG_DIR}/templates/").cyan());
        println!("  2. Open {} for notes on the current branch", ws.config.symlink.cyan());
        println!("  3. Run {} to check hooks and contexts", format!("{CLI_NAME} status").cyan());
    }
    println!();

    Ok(())
}

fn create_dir_if_missing(ws: &Workspace, path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).at(path)?;
        println!("   {} {}", "Creating".green(), display_path(ws, path));
    }
    Ok(())
}

fn write_file_if_missing(ws: &Workspace, path: &Path, content: &str) -> Result<()> {
    let display_name = display_path(ws, path);
    if path.exists() {
        println!("   {} {} (already exists)", "Skipping".yellow(), display_name);
    } else {
        fs::write(path, content).at(path)?;
        println!("   {} {}", "Creating".green(), display_name);
    }
    Ok(())
}

fn add_to_gitignore(root: &Path, entry: &str) -> Result<()> {
    let gitignore_path = root.join(".gitignore");
    let existing = fs::read_to_string(&gitignore_path).unwrap_or_default();

    if existing.lines().any(|line| line.trim() == entry) {
        return Ok(());
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(entry);
    content.push('\n');
    fs::write(&gitignore_path, content).at(&gitignore_path)?;
    println!("   {} .gitignore (added {})", "Updated".green(), entry);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_to_gitignore_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "target").unwrap();
        add_to_gitignore(dir.path(), "_branch").unwrap();
        add_to_gitignore(dir.path(), "_branch").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join(".gitignore")).unwrap(), "target\n_branch\n");
    }

    #[test]
    fn test_default_template_has_both_tags() {
        let tags = crate::tags::find_tags(DEFAULT_CONTEXT_MD);
        assert_eq!(tags.len(), 2);
    }
}
