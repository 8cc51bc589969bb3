//! Template rendering
//!
//! A template is a directory under `.bctx/templates/`. Rendering copies it into
//! a branch context, expanding `{{name}}` placeholders in text files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use chrono::Local;
use regex::{Captures, Regex};
use walkdir::WalkDir;

use crate::error::{Error, IoContext, Result};
use crate::git;

/// Extensions whose content is rendered; everything else is copied verbatim.
pub const TEMPLATE_FILE_EXTENSIONS: &[&str] = &["md", "txt", "json", "yaml", "yml", "toml"];

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"))
}

/// Variables available to templates: `branch`, `date` (YYYY-MM-DD), `author`.
///
/// `author` is git's `user.name`, or empty when unset.
pub fn template_variables(root: &Path, branch: &str) -> HashMap<String, String> {
    HashMap::from([
        ("branch".to_string(), branch.to_string()),
        ("date".to_string(), Local::now().format("%Y-%m-%d").to_string()),
        ("author".to_string(), git::user_name(root).unwrap_or_default()),
    ])
}

/// Replace `{{name}}` with its value. Unknown names are left as written.
pub fn render_content(content: &str, variables: &HashMap<String, String>) -> String {
    placeholder_re()
        .replace_all(content, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn is_template_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEMPLATE_FILE_EXTENSIONS.contains(&ext))
}

/// Copy `template_dir` into `dest_dir`, rendering text files.
///
/// Stops at the first filesystem error; whatever was already copied stays.
pub fn render(template_dir: &Path, dest_dir: &Path, variables: &HashMap<String, String>) -> Result<()> {
    for entry in WalkDir::new(template_dir).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(template_dir).to_path_buf();
            Error::io(path, e.into())
        })?;
        let src = entry.path();
        let Ok(rel) = src.strip_prefix(template_dir) else {
            continue;
        };
        let dst = dest_dir.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst).at(&dst)?;
        } else if is_template_file(src) {
            let bytes = fs::read(src).at(src)?;
            match String::from_utf8(bytes) {
                Ok(text) => fs::write(&dst, render_content(&text, variables)).at(&dst)?,
                Err(e) => fs::write(&dst, e.into_bytes()).at(&dst)?,
            }
        } else {
            fs::copy(src, &dst).at(&dst)?;
        }
    }
    Ok(())
}
