//! Git hook installation
//!
//! `bctx init` installs two hooks that call back into the binary:
//! - `post-checkout` → `bctx on-checkout <old> <new>` (branch checkouts only)
//! - `post-commit`   → `bctx on-commit`
//!
//! Our lines always sit between [`HOOK_MARKER`] and [`SNIPPET_END_MARKER`], so
//! they can be appended to a hook someone else owns and removed again later.
//! A repository-local `core.hooksPath` is honoured, including husky layouts.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{IoContext, Result};
use crate::{git, CLI_NAME};

pub const HOOK_MARKER: &str = "# branch-ctx-managed";
pub const SNIPPET_END_MARKER: &str = "# branch-ctx-end";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    PostCheckout,
    PostCommit,
}

impl HookKind {
    pub const ALL: [HookKind; 2] = [HookKind::PostCheckout, HookKind::PostCommit];

    pub fn file_name(self) -> &'static str {
        match self {
            HookKind::PostCheckout => "post-checkout",
            HookKind::PostCommit => "post-commit",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookInstall {
    Installed,
    AlreadyInstalled,
    /// Added to an existing hook we do not own.
    Appended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookUninstall {
    Uninstalled,
    NotInstalled,
    /// A hook exists but carries no marker.
    NotManaged,
}

/// Absolute path of the running binary, or the bare CLI name if unknown.
fn executable() -> String {
    std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| CLI_NAME.to_string())
}

/// Marked block of shell that invokes `exe`.
fn snippet(kind: HookKind, exe: &str) -> String {
    let body = match kind {
        HookKind::PostCheckout => format!(
            r#"if [ "$3" = "1" ]; then
  OLD_BRANCH=$(git rev-parse --abbrev-ref @{{-1}} 2>/dev/null || echo "unknown")
  NEW_BRANCH=$(git rev-parse --abbrev-ref HEAD)
  "{exe}" on-checkout "$OLD_BRANCH" "$NEW_BRANCH"
fi"#
        ),
        HookKind::PostCommit => format!(r#""{exe}" on-commit"#),
    };
    format!("{HOOK_MARKER}\n{body}\n{SNIPPET_END_MARKER}\n")
}

fn snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"(?s)\n?{}\n.*?{}\n?",
            regex::escape(HOOK_MARKER),
            regex::escape(SNIPPET_END_MARKER)
        );
        Regex::new(&pattern).expect("snippet pattern is valid")
    })
}

fn strip_snippet(content: &str) -> String {
    snippet_re().replace_all(content, "").into_owned()
}

/// True when the hook holds nothing besides our block and a shebang.
fn only_ours(content: &str) -> bool {
    if !content.contains(SNIPPET_END_MARKER) {
        return true;
    }
    strip_snippet(content)
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with("#!"))
}

/// `core.hooksPath` resolved against the repository root.
pub fn custom_hooks_dir(root: &Path) -> Option<PathBuf> {
    let configured = PathBuf::from(git::hooks_path(root)?);
    Some(if configured.is_absolute() {
        configured
    } else {
        root.join(configured)
    })
}

/// Husky points `core.hooksPath` at `.husky/_` (which contains `h`); user hooks live one level up.
fn husky_user_dir(hooks_dir: &Path) -> Option<PathBuf> {
    if hooks_dir.join("h").exists() {
        hooks_dir.parent().map(Path::to_path_buf)
    } else {
        None
    }
}

/// Where a new hook of `kind` is written.
pub fn hook_path(root: &Path, kind: HookKind) -> PathBuf {
    let dir = match custom_hooks_dir(root) {
        Some(custom) => husky_user_dir(&custom).unwrap_or(custom),
        None => root.join(".git").join("hooks"),
    };
    dir.join(kind.file_name())
}

/// Every location a hook of `kind` might live in.
fn candidate_paths(root: &Path, kind: HookKind) -> Vec<PathBuf> {
    let mut paths = vec![root.join(".git").join("hooks").join(kind.file_name())];
    if let Some(custom) = custom_hooks_dir(root) {
        if let Some(husky) = husky_user_dir(&custom) {
            paths.push(husky.join(kind.file_name()));
        }
        paths.push(custom.join(kind.file_name()));
    }
    paths.dedup();
    paths
}

pub fn is_hook_installed(root: &Path, kind: HookKind) -> bool {
    candidate_paths(root, kind).iter().any(|path| {
        fs::read_to_string(path)
            .map(|content| content.contains(HOOK_MARKER))
            .unwrap_or(false)
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).at(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms).at(path)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Keep a hook written into a tracked hooks directory out of `git status`.
fn exclude_from_git(root: &Path, hook: &Path) -> Result<()> {
    let Ok(rel) = hook.strip_prefix(root) else {
        return Ok(());
    };
    if rel.starts_with(".git") {
        return Ok(());
    }
    let pattern = rel.to_string_lossy().replace('\\', "/");

    let exclude = root.join(".git").join("info").join("exclude");
    let existing = fs::read_to_string(&exclude).unwrap_or_default();
    if existing.lines().any(|l| l.trim() == pattern) {
        return Ok(());
    }
    if let Some(parent) = exclude.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&pattern);
    content.push('\n');
    fs::write(&exclude, content).at(&exclude)
}

/// Install (or append) the hook of `kind`.
pub fn install_hook(root: &Path, kind: HookKind) -> Result<HookInstall> {
    install_hook_with(root, kind, &executable())
}

fn install_hook_with(root: &Path, kind: HookKind, exe: &str) -> Result<HookInstall> {
    if is_hook_installed(root, kind) {
        return Ok(HookInstall::AlreadyInstalled);
    }

    let path = hook_path(root, kind);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).at(dir)?;
    }

    if let Ok(mut existing) = fs::read_to_string(&path) {
        if !existing.ends_with('\n') {
            existing.push('\n');
        }
        existing.push('\n');
        existing.push_str(&snippet(kind, exe));
        fs::write(&path, existing).at(&path)?;
        debug!(hook = %path.display(), "appended to existing hook");
        return Ok(HookInstall::Appended);
    }

    fs::write(&path, format!("#!/bin/sh\n{}", snippet(kind, exe))).at(&path)?;
    make_executable(&path)?;
    exclude_from_git(root, &path)?;
    debug!(hook = %path.display(), "installed hook");
    Ok(HookInstall::Installed)
}

/// Remove our hook of `kind`, or just our block if the hook has other content.
pub fn uninstall_hook(root: &Path, kind: HookKind) -> Result<HookUninstall> {
    let candidates = candidate_paths(root, kind);

    for path in &candidates {
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        if !content.contains(HOOK_MARKER) {
            continue;
        }

        if only_ours(&content) {
            fs::remove_file(path).at(path)?;
        } else {
            // fs::write keeps the existing file mode
            fs::write(path, strip_snippet(&content)).at(path)?;
        }
        return Ok(HookUninstall::Uninstalled);
    }

    if candidates.iter().any(|p| p.exists()) {
        Ok(HookUninstall::NotManaged)
    } else {
        Ok(HookUninstall::NotInstalled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".git/hooks")).unwrap();
        dir
    }

    #[test]
    fn test_install_fresh_and_again() {
        let repo = fake_repo();
        let root = repo.path();
        assert_eq!(install_hook_with(root, HookKind::PostCommit, "/bin/bctx").unwrap(), HookInstall::Installed);
        let content = fs::read_to_string(root.join(".git/hooks/post-commit")).unwrap();
        assert!(content.starts_with("#!/bin/sh\n# branch-ctx-managed\n"));
        assert!(content.contains(r#""/bin/bctx" on-commit"#));
        assert!(is_hook_installed(root, HookKind::PostCommit));
        assert!(!is_hook_installed(root, HookKind::PostCheckout));

        assert_eq!(
            install_hook_with(root, HookKind::PostCommit, "/bin/bctx").unwrap(),
            HookInstall::AlreadyInstalled
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_installed_hook_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let repo = fake_repo();
        install_hook_with(repo.path(), HookKind::PostCheckout, "bctx").unwrap();
        let mode = fs::metadata(repo.path().join(".git/hooks/post-checkout")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_post_checkout_only_runs_for_branch_checkouts() {
        let script = snippet(HookKind::PostCheckout, "bctx");
        assert!(script.contains(r#"if [ "$3" = "1" ]"#));
        assert!(script.contains("@{-1}"));
        assert!(script.contains(r#""bctx" on-checkout "$OLD_BRANCH" "$NEW_BRANCH""#));
    }

    #[test]
    fn test_append_and_strip_foreign_hook() {
        let repo = fake_repo();
        let root = repo.path();
        let path = root.join(".git/hooks/post-commit");
        let foreign = "#!/bin/sh\necho lint\n";
        fs::write(&path, foreign).unwrap();

        assert_eq!(install_hook_with(root, HookKind::PostCommit, "bctx").unwrap(), HookInstall::Appended);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(foreign));
        assert!(content.contains(SNIPPET_END_MARKER));

        assert_eq!(uninstall_hook(root, HookKind::PostCommit).unwrap(), HookUninstall::Uninstalled);
        let cleaned = fs::read_to_string(&path).unwrap();
        assert!(cleaned.contains("echo lint"));
        assert!(!cleaned.contains(HOOK_MARKER));
    }

    #[test]
    fn test_uninstall_states() {
        let repo = fake_repo();
        let root = repo.path();
        assert_eq!(uninstall_hook(root, HookKind::PostCheckout).unwrap(), HookUninstall::NotInstalled);

        fs::write(root.join(".git/hooks/post-checkout"), "#!/bin/sh\necho hi\n").unwrap();
        assert_eq!(uninstall_hook(root, HookKind::PostCheckout).unwrap(), HookUninstall::NotManaged);

        fs::remove_file(root.join(".git/hooks/post-checkout")).unwrap();
        install_hook_with(root, HookKind::PostCheckout, "bctx").unwrap();
        assert_eq!(uninstall_hook(root, HookKind::PostCheckout).unwrap(), HookUninstall::Uninstalled);
        assert!(!root.join(".git/hooks/post-checkout").exists());
    }

    #[test]
    fn test_legacy_hook_without_end_marker_is_removed() {
        let repo = fake_repo();
        let path = repo.path().join(".git/hooks/post-commit");
        fs::write(&path, format!("#!/bin/sh\n{HOOK_MARKER}\nbctx on-commit\n")).unwrap();
        assert_eq!(uninstall_hook(repo.path(), HookKind::PostCommit).unwrap(), HookUninstall::Uninstalled);
        assert!(!path.exists());
    }

    #[test]
    fn test_husky_dir_resolution() {
        let dir = TempDir::new().unwrap();
        let husky = dir.path().join(".husky");
        fs::create_dir_all(husky.join("_")).unwrap();
        fs::write(husky.join("_").join("h"), "").unwrap();
        assert_eq!(husky_user_dir(&husky.join("_")), Some(husky.clone()));
        assert_eq!(husky_user_dir(&husky), None);
    }
}
