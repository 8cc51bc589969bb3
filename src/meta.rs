//! Branch metadata store
//!
//! One JSON map per store, keyed by branch key:
//! - live:     `.bctx/branches/meta.json`
//! - archived: `.bctx/branches/_archived/meta.json`
//!
//! Every write loads the whole document and replaces it. Two hooks racing on
//! the same repository resolve as last-writer-wins; the rename-based write in
//! [`crate::config`] guarantees the loser never leaves a torn file behind.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{load_json, save_json, Workspace};
use crate::error::Result;
use crate::git::{self, LastCommit};

/// Everything recorded about one branch context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BranchMeta {
    /// Raw branch name (before sanitizing)
    pub branch: String,
    /// Set once when the record is created
    pub created_at: String,
    /// git `user.name` at creation time
    pub author: Option<String>,
    /// Refreshed on every checkout/commit
    pub updated_at: String,
    pub last_commit: Option<LastCommit>,
    /// `git log <base>..HEAD --oneline`
    pub commits: String,
    /// Aligned status + line-count listing, see [`format_changed_files`]
    pub changed_files: String,
}

pub type MetaMap = BTreeMap<String, BranchMeta>;

fn now() -> String {
    Local::now().to_rfc3339()
}

/// Live records. Missing or corrupt file → empty map.
pub fn load_branch_meta(ws: &Workspace) -> MetaMap {
    load_json(&ws.meta_path())
}

/// Archived records. Missing or corrupt file → empty map.
pub fn load_archived_meta(ws: &Workspace) -> MetaMap {
    load_json(&ws.archived_meta_path())
}

pub fn get_branch_meta(ws: &Workspace, key: &str) -> Option<BranchMeta> {
    load_branch_meta(ws).remove(key)
}

/// Insert a fresh record unless `key` already has one. Returns whether it inserted.
pub fn create_branch_meta(ws: &Workspace, key: &str, branch: &str) -> Result<bool> {
    let mut meta = load_branch_meta(ws);
    if meta.contains_key(key) {
        return Ok(false);
    }

    let now = now();
    meta.insert(
        key.to_string(),
        BranchMeta {
            branch: branch.to_string(),
            created_at: now.clone(),
            author: git::user_name(ws.root()),
            updated_at: now,
            last_commit: None,
            commits: String::new(),
            changed_files: String::new(),
        },
    );
    save_json(&ws.meta_path(), &meta, "branch metadata")?;
    debug!(key, branch, "created branch metadata");
    Ok(true)
}

/// Recompute commits, changed files and last commit against `base`.
///
/// No-op (returns `false`) when `key` has no record yet.
pub fn update_branch_meta(ws: &Workspace, key: &str, base: &str) -> Result<bool> {
    let mut meta = load_branch_meta(ws);
    let Some(record) = meta.get_mut(key) else {
        debug!(key, "no metadata record to update");
        return Ok(false);
    };

    let root = ws.root();
    record.updated_at = now();
    record.last_commit = git::last_commit(root);
    record.commits = git::commits_since(root, base).unwrap_or_default();
    record.changed_files = changed_files(root, base);

    save_json(&ws.meta_path(), &meta, "branch metadata")?;
    debug!(key, base, "updated branch metadata");
    Ok(true)
}

/// Move the record `key` from the live map to the archive map, filed under
/// `archived_key` (the name of its archived directory).
///
/// The archive is written before the live map so an interrupted move leaves a
/// duplicate rather than losing the record.
pub fn archive_branch_meta(ws: &Workspace, key: &str, archived_key: &str) -> Result<bool> {
    let mut meta = load_branch_meta(ws);
    let Some(record) = meta.remove(key) else {
        return Ok(false);
    };

    let mut archived = load_archived_meta(ws);
    archived.insert(archived_key.to_string(), record);
    save_json(&ws.archived_meta_path(), &archived, "archived metadata")?;
    save_json(&ws.meta_path(), &meta, "branch metadata")?;
    Ok(true)
}

pub fn delete_branch_meta(ws: &Workspace, key: &str) -> Result<bool> {
    let mut meta = load_branch_meta(ws);
    if meta.remove(key).is_none() {
        return Ok(false);
    }
    save_json(&ws.meta_path(), &meta, "branch metadata")?;
    Ok(true)
}

/// Changed files between the merge-base of `base` and HEAD. Empty on any git failure.
pub fn changed_files(root: &Path, base: &str) -> String {
    let Some(name_status) = git::diff_name_status(root, base) else {
        return String::new();
    };
    let Some(numstat) = git::diff_numstat(root, base) else {
        return String::new();
    };
    format_changed_files(&name_status, &numstat)
}

/// Resolve the destination path of a numstat entry.
///
/// Renames appear as `old => new` or `dir/{old => new}/file`.
fn numstat_new_path(raw: &str) -> String {
    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if open < close {
            if let Some((_, new)) = raw[open + 1..close].split_once(" => ") {
                let joined = format!("{}{}{}", &raw[..open], new, &raw[close + 1..]);
                return joined.replace("//", "/");
            }
        }
    }
    match raw.split_once(" => ") {
        Some((_, new)) => new.to_string(),
        None => raw.to_string(),
    }
}

struct ChangedFile {
    status: char,
    display: String,
    added: String,
    removed: String,
}

/// Merge `--name-status` and `--numstat` output into an aligned listing:
///
/// ```text
/// A  src/new.rs                      (+40 -0)
/// M  src/lib.rs                      (+3 -1)
/// R  src/util.rs  <-  src/helpers.rs (+0 -0)
/// ```
///
/// Paths are padded so the `(` column is identical on every line.
pub fn format_changed_files(name_status: &str, numstat: &str) -> String {
    let mut stats: BTreeMap<String, (String, String)> = BTreeMap::new();
    for line in numstat.lines().filter(|l| !l.is_empty()) {
        let mut parts = line.splitn(3, '\t');
        if let (Some(added), Some(removed), Some(path)) = (parts.next(), parts.next(), parts.next()) {
            stats.insert(numstat_new_path(path), (added.to_string(), removed.to_string()));
        }
    }

    let files: Vec<ChangedFile> = name_status
        .lines()
        .filter(|l| !l.is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            let status = parts.first()?.chars().next()?;
            let (path, display) = match (status, parts.as_slice()) {
                ('R' | 'C', [_, old, new, ..]) => (*new, format!("{new}  <-  {old}")),
                (_, [_, .., path]) => (*path, path.to_string()),
                _ => return None,
            };
            let (added, removed) = stats
                .get(path)
                .cloned()
                .unwrap_or_else(|| ("0".to_string(), "0".to_string()));
            Some(ChangedFile {
                status,
                display,
                added,
                removed,
            })
        })
        .collect();

    let width = files
        .iter()
        .map(|f| f.display.chars().count())
        .max()
        .unwrap_or(0);

    files
        .iter()
        .map(|f| {
            format!(
                "{}  {:<width$}  (+{} -{})",
                f.status, f.display, f.added, f.removed
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> Workspace {
        Workspace::new(dir.path(), Config::default())
    }

    fn paren_column(line: &str) -> Option<usize> {
        line.chars().position(|c| c == '(')
    }

    #[test]
    fn test_create_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        assert!(create_branch_meta(&ws, "feature-x", "feature/x").unwrap());
        let first = get_branch_meta(&ws, "feature-x").unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(!create_branch_meta(&ws, "feature-x", "feature/x").unwrap());
        let second = get_branch_meta(&ws, "feature-x").unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.branch, "feature/x");
        assert_eq!(second.last_commit, None);
        assert!(second.commits.is_empty());
    }

    #[test]
    fn test_update_missing_key_is_noop() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        assert!(!update_branch_meta(&ws, "ghost", "origin/main").unwrap());
        assert!(load_branch_meta(&ws).is_empty());
    }

    #[test]
    fn test_archive_moves_between_maps() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        create_branch_meta(&ws, "a", "a").unwrap();
        create_branch_meta(&ws, "b", "b").unwrap();

        assert!(archive_branch_meta(&ws, "a", "a").unwrap());
        let live = load_branch_meta(&ws);
        let archived = load_archived_meta(&ws);
        assert!(!live.contains_key("a"));
        assert!(archived.contains_key("a"));
        assert!(live.contains_key("b"));

        assert!(!archive_branch_meta(&ws, "a", "a").unwrap());
    }

    #[test]
    fn test_archive_under_distinct_key_keeps_earlier_record() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        create_branch_meta(&ws, "a", "a").unwrap();
        archive_branch_meta(&ws, "a", "a").unwrap();
        create_branch_meta(&ws, "a", "a").unwrap();
        archive_branch_meta(&ws, "a", "a-20260101000000").unwrap();

        let archived = load_archived_meta(&ws);
        assert_eq!(archived.len(), 2);
        assert!(archived.contains_key("a"));
        assert!(archived.contains_key("a-20260101000000"));
        assert!(load_branch_meta(&ws).is_empty());
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        create_branch_meta(&ws, "a", "a").unwrap();
        assert!(delete_branch_meta(&ws, "a").unwrap());
        assert!(!delete_branch_meta(&ws, "a").unwrap());
        assert!(get_branch_meta(&ws, "a").is_none());
    }

    #[test]
    fn test_corrupt_meta_is_empty() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        std::fs::create_dir_all(ws.branches_dir()).unwrap();
        std::fs::write(ws.meta_path(), "[1, 2").unwrap();
        assert!(load_branch_meta(&ws).is_empty());
        assert!(create_branch_meta(&ws, "main", "main").unwrap());
        assert_eq!(load_branch_meta(&ws).len(), 1);
    }

    #[test]
    fn test_record_with_missing_fields_loads() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        std::fs::create_dir_all(ws.branches_dir()).unwrap();
        std::fs::write(ws.meta_path(), r#"{"main": {"branch": "main"}}"#).unwrap();
        let record = get_branch_meta(&ws, "main").unwrap();
        assert_eq!(record.branch, "main");
        assert!(record.changed_files.is_empty());
    }

    #[test]
    fn test_format_changed_files() {
        let name_status = "A\tsrc/new.rs\nM\tREADME.md\nD\told.txt";
        let numstat = "40\t0\tsrc/new.rs\n3\t1\tREADME.md\n0\t12\told.txt";
        let out = format_changed_files(name_status, numstat);
        assert_eq!(
            out,
            "A  src/new.rs  (+40 -0)\nM  README.md   (+3 -1)\nD  old.txt     (+0 -12)"
        );
    }

    #[test]
    fn test_format_changed_files_rename() {
        let name_status = "R100\tsrc/helpers.rs\tsrc/util.rs\nM\tsrc/lib.rs";
        let numstat = "0\t0\tsrc/{helpers.rs => util.rs}\n2\t2\tsrc/lib.rs";
        let out = format_changed_files(name_status, numstat);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "R  src/util.rs  <-  src/helpers.rs  (+0 -0)");
        assert!(lines[1].starts_with("M  src/lib.rs "));
        assert!(lines[1].ends_with("(+2 -2)"));
        assert_eq!(paren_column(lines[0]), paren_column(lines[1]));
    }

    #[test]
    fn test_format_changed_files_binary() {
        let out = format_changed_files("A\tlogo.png", "-\t-\tlogo.png");
        assert_eq!(out, "A  logo.png  (+- --)");
    }

    #[test]
    fn test_format_changed_files_empty() {
        assert_eq!(format_changed_files("", ""), "");
    }

    #[test]
    fn test_numstat_new_path() {
        assert_eq!(numstat_new_path("src/lib.rs"), "src/lib.rs");
        assert_eq!(numstat_new_path("a.txt => b.txt"), "b.txt");
        assert_eq!(numstat_new_path("src/{old => new}/mod.rs"), "src/new/mod.rs");
        assert_eq!(numstat_new_path("{ => nested}/a.rs"), "nested/a.rs");
        assert_eq!(numstat_new_path("src/{flat => }/a.rs"), "src/a.rs");
    }

    proptest! {
        #[test]
        fn prop_paren_column_aligned(
            files in proptest::collection::vec(
                ("[AMD]", "[a-z_/.]{1,30}", 0u32..5000, 0u32..5000),
                2..12,
            )
        ) {
            let name_status: Vec<String> = files.iter().map(|(s, p, _, _)| format!("{s}\t{p}")).collect();
            let numstat: Vec<String> = files.iter().map(|(_, p, a, r)| format!("{a}\t{r}\t{p}")).collect();
            let out = format_changed_files(&name_status.join("\n"), &numstat.join("\n"));

            let columns: Vec<Option<usize>> = out.lines().map(paren_column).collect();
            prop_assert_eq!(columns.len(), files.len());
            prop_assert!(columns.iter().all(|c| c.is_some() && *c == columns[0]));
        }
    }
}
