//! Configuration file support for branchctx
//!
//! Reads `.bctx/config.json` at the repository root. The parsed [`Config`] is
//! bundled with the root into a [`Workspace`], built once per invocation and
//! passed down by reference.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::branch_key::sanitize;
use crate::error::{Error, IoContext, Result};
use crate::git;

pub const CONFIG_DIR: &str = ".bctx";
pub const CONFIG_FILE: &str = "config.json";
pub const TEMPLATES_DIR: &str = "templates";
pub const BRANCHES_DIR: &str = "branches";
pub const ARCHIVED_DIR: &str = "_archived";
pub const META_FILE: &str = "meta.json";

pub const DEFAULT_SYMLINK: &str = "_branch";
pub const DEFAULT_TEMPLATE: &str = "_default";
pub const DEFAULT_BASE_BRANCH: &str = "origin/main";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Name of the symlink at the repository root
    /// Default: "_branch"
    #[serde(default = "default_symlink")]
    pub symlink: String,

    /// Play a sound after each sync
    #[serde(default)]
    pub sound: bool,

    /// Sound to play; nothing plays when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_file: Option<String>,

    /// Branch-prefix → template rules, checked in order
    #[serde(default)]
    pub template_rules: Vec<TemplateRule>,

    /// Base branch pinned into new contexts
    /// Default: "origin/main"
    #[serde(default = "default_base_branch")]
    pub default_base_branch: String,
}

/// Pick `template` for branches starting with `prefix`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TemplateRule {
    pub prefix: String,
    pub template: String,
}

fn default_symlink() -> String {
    DEFAULT_SYMLINK.to_string()
}

fn default_base_branch() -> String {
    DEFAULT_BASE_BRANCH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symlink: default_symlink(),
            sound: false,
            sound_file: None,
            template_rules: Vec::new(),
            default_base_branch: default_base_branch(),
        }
    }
}

impl Config {
    /// Load config from `<root>/.bctx/config.json`.
    /// Returns default config if the file is missing or unreadable.
    pub fn load(root: &Path) -> Self {
        load_json(&root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Write config to `<root>/.bctx/config.json`.
    pub fn save(&self, root: &Path) -> Result<()> {
        save_json(&root.join(CONFIG_DIR).join(CONFIG_FILE), self, "config")
    }

    /// Template for a new branch context: first matching prefix rule, else `_default`.
    pub fn template_for_branch(&self, branch: &str) -> &str {
        self.template_rules
            .iter()
            .find(|rule| branch.starts_with(&rule.prefix))
            .map(|rule| rule.template.as_str())
            .unwrap_or(DEFAULT_TEMPLATE)
    }
}

/// A git repository root plus its parsed config.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Load the config found under `root`.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config = Config::load(&root);
        Self { root, config }
    }

    /// Find the repository containing `cwd` and load its config.
    pub fn discover(cwd: &Path) -> Result<Self> {
        let root = git::git_root(cwd).ok_or(Error::NotGitRepo)?;
        debug!(root = %root.display(), "found git root");
        Ok(Self::open(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    pub fn require_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join(CONFIG_FILE)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.config_dir().join(TEMPLATES_DIR)
    }

    pub fn template_dir(&self, name: &str) -> PathBuf {
        self.templates_dir().join(name)
    }

    pub fn branches_dir(&self) -> PathBuf {
        self.config_dir().join(BRANCHES_DIR)
    }

    pub fn archived_dir(&self) -> PathBuf {
        self.branches_dir().join(ARCHIVED_DIR)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.branches_dir().join(META_FILE)
    }

    pub fn archived_meta_path(&self) -> PathBuf {
        self.archived_dir().join(META_FILE)
    }

    /// Context directory for a raw branch name.
    pub fn branch_dir(&self, branch: &str) -> PathBuf {
        self.branches_dir().join(sanitize(branch))
    }

    pub fn symlink_path(&self) -> PathBuf {
        self.root.join(&self.config.symlink)
    }

    /// Template directory names, sorted.
    pub fn list_templates(&self) -> Vec<String> {
        list_dirs(&self.templates_dir())
    }
}

/// Names of the non-hidden subdirectories of `dir`, sorted. Missing dir → empty.
pub(crate) fn list_dirs(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    names
}

/// Read a JSON document, falling back to `T::default()` when it is missing or corrupt.
pub(crate) fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return T::default(),
    };
    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupt JSON file");
            T::default()
        }
    }
}

/// Write a JSON document by renaming a sibling temp file over `path`.
pub(crate) fn save_json<T: Serialize>(path: &Path, value: &T, what: &'static str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::io(path, std::io::ErrorKind::InvalidInput.into()))?;
    fs::create_dir_all(dir).at(dir)?;

    let mut json = serde_json::to_string_pretty(value).map_err(|source| Error::Json { what, source })?;
    json.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir).at(dir)?;
    std::io::Write::write_all(&mut tmp, json.as_bytes()).at(tmp.path().to_path_buf())?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.symlink, "_branch");
        assert!(!config.sound);
        assert_eq!(config.default_base_branch, "origin/main");
        assert_eq!(config.template_for_branch("feature/x"), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_parse_config_merges_defaults() {
        let json = r#"{ "sound": true, "template_rules": [{"prefix": "fix/", "template": "bugfix"}] }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.sound);
        assert_eq!(config.symlink, "_branch");
        assert_eq!(config.default_base_branch, "origin/main");
        assert_eq!(config.template_for_branch("fix/crash"), "bugfix");
    }

    #[test]
    fn test_template_rules_first_match_wins() {
        let config = Config {
            template_rules: vec![
                TemplateRule {
                    prefix: "feature/".to_string(),
                    template: "feature".to_string(),
                },
                TemplateRule {
                    prefix: "feature/ui-".to_string(),
                    template: "ui".to_string(),
                },
            ],
            ..Config::default()
        };
        assert_eq!(config.template_for_branch("feature/ui-button"), "feature");
        assert_eq!(config.template_for_branch("hotfix/1"), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_load_missing_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());
    }

    #[test]
    fn test_load_corrupt_is_default() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(CONFIG_DIR)).unwrap();
        fs::write(dir.path().join(CONFIG_DIR).join(CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            symlink: "_ctx".to_string(),
            sound: true,
            sound_file: Some("/tmp/ding.oga".to_string()),
            template_rules: vec![TemplateRule {
                prefix: "feature/".to_string(),
                template: "feature".to_string(),
            }],
            default_base_branch: "origin/develop".to_string(),
        };
        config.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()), config);
    }

    #[test]
    fn test_workspace_layout() {
        let ws = Workspace::new("/repo", Config::default());
        assert_eq!(ws.branch_dir("feature/login"), PathBuf::from("/repo/.bctx/branches/feature-login"));
        assert_eq!(ws.archived_meta_path(), PathBuf::from("/repo/.bctx/branches/_archived/meta.json"));
        assert_eq!(ws.symlink_path(), PathBuf::from("/repo/_branch"));
        assert!(!ws.is_initialized());
    }

    #[test]
    fn test_list_templates_sorted_and_skips_files() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path(), Config::default());
        fs::create_dir_all(ws.template_dir("feature")).unwrap();
        fs::create_dir_all(ws.template_dir("_default")).unwrap();
        fs::create_dir_all(ws.template_dir(".hidden")).unwrap();
        fs::write(ws.templates_dir().join("README.md"), "x").unwrap();
        assert_eq!(ws.list_templates(), vec!["_default", "feature"]);
    }
}
