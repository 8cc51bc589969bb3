//! Thin wrappers over the `git` CLI.
//!
//! Every call is blocking and failure-tolerant: a non-zero exit, a missing
//! binary or non-UTF-8 output all come back as `None`. Hooks must never fail
//! because a base ref is missing in a shallow clone or HEAD is detached.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Most recent commit on HEAD.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LastCommit {
    /// Abbreviated (7 char) hash
    pub hash: String,
    /// Subject line
    pub message: String,
    /// Author date, strict ISO 8601
    pub datetime: String,
}

/// Run `git <args>` in `cwd` and return trimmed stdout on success.
fn run(cwd: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).current_dir(cwd).output();
    match output {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout)
            .ok()
            .map(|s| s.trim().to_string()),
        Ok(output) => {
            debug!(
                ?args,
                code = output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git command failed"
            );
            None
        }
        Err(e) => {
            debug!(?args, error = %e, "could not spawn git");
            None
        }
    }
}

/// Top-level directory of the repository containing `cwd`.
pub fn git_root(cwd: &Path) -> Option<PathBuf> {
    run(cwd, &["rev-parse", "--show-toplevel"])
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Name of the checked-out branch.
///
/// On an unborn branch (fresh `git init`, no commits) `rev-parse` fails, so
/// the symbolic ref in `.git/HEAD` is read instead. A detached HEAD yields
/// `Some("HEAD")`; callers decide what to do with it.
pub fn current_branch(cwd: &Path) -> Option<String> {
    if let Some(branch) = run(cwd, &["rev-parse", "--abbrev-ref", "HEAD"]).filter(|s| !s.is_empty())
    {
        return Some(branch);
    }

    let head = std::fs::read_to_string(cwd.join(".git").join("HEAD")).ok()?;
    head.trim()
        .strip_prefix("ref: refs/heads/")
        .map(str::to_string)
}

/// Local branch names, short form.
pub fn list_branches(cwd: &Path) -> Vec<String> {
    run(cwd, &["branch", "--format=%(refname:short)"])
        .map(|out| {
            out.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `git log <base>..HEAD --oneline`, one commit per line.
pub fn commits_since(cwd: &Path, base: &str) -> Option<String> {
    let range = format!("{base}..HEAD");
    run(cwd, &["log", &range, "--oneline"])
}

/// `git diff --name-status -M100 <base>...HEAD` (merge-base semantics).
pub fn diff_name_status(cwd: &Path, base: &str) -> Option<String> {
    let range = format!("{base}...HEAD");
    run(cwd, &["diff", "--name-status", "-M100", &range])
}

/// `git diff --numstat -M100 <base>...HEAD` (merge-base semantics).
pub fn diff_numstat(cwd: &Path, base: &str) -> Option<String> {
    let range = format!("{base}...HEAD");
    run(cwd, &["diff", "--numstat", "-M100", &range])
}

/// Hash, subject and author date of HEAD.
pub fn last_commit(cwd: &Path) -> Option<LastCommit> {
    let out = run(cwd, &["log", "-1", "--format=%H|%s|%aI"])?;
    let mut parts = out.splitn(3, '|');
    let hash = parts.next()?;
    let message = parts.next()?;
    let datetime = parts.next()?;
    Some(LastCommit {
        hash: hash.chars().take(7).collect(),
        message: message.to_string(),
        datetime: datetime.to_string(),
    })
}

/// `git config [--global] <key>`.
pub fn config_get(cwd: &Path, key: &str, global: bool) -> Option<String> {
    let mut args = vec!["config"];
    if global {
        args.push("--global");
    }
    args.push(key);
    run(cwd, &args)
}

/// `git config [--global] --unset <key>`. Returns whether git succeeded.
pub fn config_unset(cwd: &Path, key: &str, global: bool) -> bool {
    let mut args = vec!["config"];
    if global {
        args.push("--global");
    }
    args.extend(["--unset", key]);
    run(cwd, &args).is_some()
}

/// `user.name`, if configured.
pub fn user_name(cwd: &Path) -> Option<String> {
    config_get(cwd, "user.name", false).filter(|s| !s.is_empty())
}

/// Repository-local `core.hooksPath`, if set.
pub fn hooks_path(cwd: &Path) -> Option<String> {
    run(cwd, &["config", "--get", "core.hooksPath"]).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_not_a_repo() {
        let dir = TempDir::new().unwrap();
        assert_eq!(git_root(dir.path()), None);
        assert_eq!(current_branch(dir.path()), None);
        assert!(list_branches(dir.path()).is_empty());
        assert_eq!(last_commit(dir.path()), None);
    }

    #[test]
    fn test_head_file_fallback() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/feature/x\n").unwrap();
        assert_eq!(current_branch(dir.path()), Some("feature/x".to_string()));
    }

    #[test]
    fn test_missing_base_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(commits_since(dir.path(), "origin/main"), None);
        assert_eq!(diff_name_status(dir.path(), "origin/main"), None);
    }
}
