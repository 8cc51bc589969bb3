use std::fs;
use std::path::Path;

use colored::Colorize;

use super::{checked_out_branch, initialized_workspace};
use crate::config::DEFAULT_TEMPLATE;
use crate::error::Result;
use crate::hooks::{is_hook_installed, HookKind};
use crate::prune::orphan_contexts;
use crate::sync::list_branches;
use crate::{git, CLI_NAME};

/// Health checklist, printed as it is collected.
#[derive(Default)]
struct Health {
    issues: usize,
    warnings: usize,
}

impl Health {
    fn ok(&mut self, msg: &str) {
        println!("  {} {msg}", "[ok]".green());
    }

    fn issue(&mut self, msg: &str) {
        self.issues += 1;
        println!("  {} {msg}", "[!!]".red());
    }

    fn warn(&mut self, msg: &str) {
        self.warnings += 1;
        println!("  {} {msg}", "[--]".yellow());
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// `bctx status`. Returns `false` when the checklist found issues.
pub fn status(cwd: &Path) -> Result<bool> {
    let ws = initialized_workspace(cwd)?;
    let root = ws.root();
    let symlink_path = ws.symlink_path();
    let symlink_target = fs::read_link(&symlink_path).ok();

    println!("{}  {}", "Repository:".bold(), root.display());
    println!(
        "{}      {}",
        "Branch:".bold(),
        checked_out_branch(&ws).unwrap_or_else(|| "(detached)".to_string())
    );
    match &symlink_target {
        Some(target) => println!("{}     {} -> {}", "Symlink:".bold(), ws.config.symlink, target.display()),
        None => println!("{}     {} (not set)", "Symlink:".bold(), ws.config.symlink),
    }

    let hooks: Vec<String> = HookKind::ALL
        .into_iter()
        .filter(|kind| is_hook_installed(root, *kind))
        .map(|kind| kind.to_string())
        .collect();
    println!("{}       {}", "Hooks:".bold(), join_or_none(&hooks));

    let templates = ws.list_templates();
    println!("{}   {}", "Templates:".bold(), join_or_none(&templates));
    println!("{}    {} branches", "Contexts:".bold(), list_branches(&ws).len());

    if let Some(global) = git::config_get(root, "core.hooksPath", true) {
        println!("{}      {}", "Global:".bold(), global);
    }

    println!("\n{}", "Health:".bold());
    let mut health = Health::default();

    for kind in HookKind::ALL {
        if is_hook_installed(root, kind) {
            health.ok(&format!("{kind} hook installed"));
        } else if kind == HookKind::PostCheckout {
            health.issue(&format!("{kind} hook not installed"));
        } else {
            health.warn(&format!("{kind} hook not installed"));
        }
    }

    if ws.templates_dir().is_dir() {
        health.ok("templates/ exists");
    } else {
        health.issue("templates/ missing");
    }

    if templates.iter().any(|t| t == DEFAULT_TEMPLATE) {
        health.ok(&format!("{DEFAULT_TEMPLATE} template exists"));
    } else {
        health.issue(&format!("{DEFAULT_TEMPLATE} template missing"));
    }

    match &symlink_target {
        Some(target) if root.join(target).exists() => health.ok("symlink valid"),
        Some(target) => health.issue(&format!("symlink broken -> {}", target.display())),
        None if fs::symlink_metadata(&symlink_path).is_ok() => {
            health.issue(&format!("{} is not a symlink", ws.config.symlink))
        }
        None => health.warn(&format!("symlink not set (run '{CLI_NAME} sync')")),
    }

    let orphans = orphan_contexts(&ws);
    if orphans.is_empty() {
        health.ok("no orphan contexts");
    } else {
        health.warn(&format!(
            "{} orphan contexts (run '{CLI_NAME} branches prune')",
            orphans.len()
        ));
    }

    Ok(health.issues == 0)
}
