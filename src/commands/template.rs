use std::path::Path;

use colored::Colorize;

use super::{initialized_workspace, refresh_branch, require_branch};
use crate::error::{Error, Result};
use crate::sync::{reset_branch_context, ResetOutcome};

/// `bctx template <name>`: wipe the current context and render `name` into it.
pub fn template(cwd: &Path, name: Option<&str>) -> Result<()> {
    let ws = initialized_workspace(cwd)?;
    let branch = require_branch(&ws)?;

    let available = ws.list_templates();
    if available.is_empty() {
        return Err(Error::NoTemplates);
    }
    let Some(name) = name else {
        return Err(Error::TemplateNameRequired { available });
    };
    if !available.iter().any(|t| t == name) {
        return Err(Error::TemplateNotFound {
            name: name.to_string(),
            available,
        });
    }

    match reset_branch_context(&ws, &branch, Some(name))? {
        ResetOutcome::Reset => {}
        ResetOutcome::TemplateNotFound => {
            return Err(Error::TemplateNotFound {
                name: name.to_string(),
                available,
            })
        }
    }
    refresh_branch(&ws, &branch)?;

    println!("{} template '{name}' to '{branch}'", "Applied".green());
    Ok(())
}
