//! branchctx - per-branch context directories for git repositories
//!
//! Keep notes, plans and scratch files scoped to the branch you are on.
//!
//! # Overview
//!
//! Each branch gets a directory under `.bctx/branches/<key>`, created from a
//! template the first time the branch is checked out. A symlink at the
//! repository root (`_branch` by default) always points at the context of the
//! current branch. Git hooks keep it in sync on checkout and refresh embedded
//! tags on commit.
//!
//! # Layout
//!
//! | Path | Purpose |
//! |------|---------|
//! | `.bctx/config.json` | symlink name, sound, template rules, default base branch |
//! | `.bctx/templates/<name>/` | one directory per template |
//! | `.bctx/branches/<key>/` | one context per branch, with its `base_branch` |
//! | `.bctx/branches/meta.json` | live metadata map |
//! | `.bctx/branches/_archived/` | pruned contexts and their metadata |
//!
//! # Tags
//!
//! `<bctx:commits>…</bctx:commits>` and `<bctx:files>…</bctx:files>` in any
//! `.md` / `.txt` context file are rewritten with the commits and changed
//! files since the branch's base.
//!
//! # Quick Start
//!
//! ```no_run
//! use branchctx::{sync_branch, update_branch_meta, update_context_tags, Workspace};
//!
//! let ws = Workspace::discover(std::path::Path::new(".")).unwrap();
//! let result = sync_branch(&ws, "feature/login").unwrap();
//!
//! let base = branchctx::get_base_branch(&ws, &result.branch_dir);
//! update_branch_meta(&ws, "feature-login", &base).unwrap();
//! let updates = update_context_tags(&ws, &result.branch_dir, "feature-login", &base).unwrap();
//! println!("{} tag(s) refreshed", updates.len());
//! ```

pub mod base_branch;
pub mod branch_key;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod hooks;
pub mod meta;
pub mod prune;
pub mod sound;
pub mod sync;
pub mod tags;
pub mod template;

/// Name of the binary, used in messages and hook scripts.
pub const CLI_NAME: &str = "bctx";

pub use base_branch::{get_base_branch, init_base_branch, save_base_branch};
pub use branch_key::sanitize;
pub use config::{Config, TemplateRule, Workspace};
pub use error::{Error, Result};
pub use hooks::{HookInstall, HookKind, HookUninstall};
pub use meta::{
    archive_branch_meta, create_branch_meta, delete_branch_meta, format_changed_files, load_archived_meta,
    load_branch_meta, update_branch_meta, BranchMeta,
};
pub use prune::prune;
pub use sync::{
    archive_branch, create_branch_context, list_archived_branches, list_branches, reset_branch_context,
    sync_branch, update_symlink, CreateOutcome, ResetOutcome, SymlinkUpdate, SyncResult,
};
pub use tags::{update_context_tags, TagUpdate};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        assert_eq!(CLI_NAME, "bctx");
        assert_eq!(sanitize("a/b"), "a-b");
        let _ = Config::default();
    }
}
