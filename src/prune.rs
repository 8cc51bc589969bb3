//! Reconcile branch contexts with the branches git actually has.
//!
//! A context whose key matches no local branch is an orphan. Pruning moves
//! orphans into `_archived/`; nothing is ever deleted.

use std::collections::BTreeSet;

use tracing::warn;

use crate::branch_key::sanitize;
use crate::config::Workspace;
use crate::error::Result;
use crate::git;
use crate::sync::{archive_branch, list_branches};

/// Context keys with no matching git branch, sorted.
pub fn find_orphans(context_keys: &[String], git_branches: &[String]) -> Vec<String> {
    let live: BTreeSet<String> = git_branches.iter().map(|b| sanitize(b)).collect();
    let orphans: BTreeSet<&String> = context_keys.iter().filter(|k| !live.contains(*k)).collect();
    orphans.into_iter().cloned().collect()
}

/// Orphaned contexts in this workspace.
///
/// When git reports no branches at all (unborn repository, or git failed)
/// every context would look orphaned, so none are reported.
pub fn orphan_contexts(ws: &Workspace) -> Vec<String> {
    let git_branches = git::list_branches(ws.root());
    if git_branches.is_empty() {
        warn!("git reported no branches; skipping orphan detection");
        return Vec::new();
    }
    find_orphans(&list_branches(ws), &git_branches)
}

/// Archive every orphaned context and its metadata. Returns the archived keys.
pub fn prune(ws: &Workspace) -> Result<Vec<String>> {
    let mut archived = Vec::new();
    for key in orphan_contexts(ws) {
        if archive_branch(ws, &key)? {
            archived.push(key);
        }
    }
    Ok(archived)
}
