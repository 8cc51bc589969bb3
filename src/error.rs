//! Error types for branchctx.
//!
//! Only conditions the user has to act on are errors. Git failures degrade to
//! empty values and corrupt JSON loads as defaults, so neither appears here.

use std::path::PathBuf;

use thiserror::Error;

use crate::CLI_NAME;

/// Fatal conditions for a single `bctx` invocation.
#[derive(Error, Debug)]
pub enum Error {
    /// The working directory is not inside a git repository.
    #[error("not a git repository")]
    NotGitRepo,

    /// `.bctx/config.json` does not exist yet.
    #[error("not initialized. Run '{cli} init' first", cli = CLI_NAME)]
    NotInitialized,

    /// HEAD could not be resolved to a branch name.
    #[error("could not determine current branch")]
    NoCurrentBranch,

    /// An explicitly requested template directory does not exist.
    #[error("template '{name}' not found (available: {})", .available.join(", "))]
    TemplateNotFound {
        /// The requested template.
        name: String,
        /// Templates that do exist.
        available: Vec<String>,
    },

    /// `template` was run without a name and there is no way to ask for one.
    #[error("template name required. Usage: {cli} template <name> (available: {})", .available.join(", "), cli = CLI_NAME)]
    TemplateNameRequired {
        /// Templates that do exist.
        available: Vec<String>,
    },

    /// `.bctx/templates/` holds no template directories.
    #[error("no templates found")]
    NoTemplates,

    /// A filesystem operation failed.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be serialized.
    #[error("could not serialize {what}: {source}")]
    Json {
        /// What was being written.
        what: &'static str,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach a path to `std::io::Result` values.
pub(crate) trait IoContext<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_single_line() {
        let errors = [
            Error::NotGitRepo,
            Error::NotInitialized,
            Error::NoCurrentBranch,
            Error::TemplateNotFound {
                name: "nope".to_string(),
                available: vec!["_default".to_string(), "feature".to_string()],
            },
            Error::NoTemplates,
        ];
        for e in errors {
            assert!(!e.to_string().contains('\n'), "{e}");
        }
    }

    #[test]
    fn test_template_not_found_lists_available() {
        let e = Error::TemplateNotFound {
            name: "bug".to_string(),
            available: vec!["_default".to_string(), "feature".to_string()],
        };
        assert_eq!(
            e.to_string(),
            "template 'bug' not found (available: _default, feature)"
        );
    }

    #[test]
    fn test_not_initialized_mentions_init() {
        assert!(Error::NotInitialized.to_string().contains("bctx init"));
    }
}
