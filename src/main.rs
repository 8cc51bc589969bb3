use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use branchctx::{commands, Error, CLI_NAME};

/// Environment variable holding a full tracing filter directive.
const LOG_ENV: &str = "BCTX_LOG";

#[derive(Parser, Debug)]
#[command(name = "bctx")]
#[command(author, version, about = "Per-branch context directories for git repositories")]
struct Cli {
    /// Log what is happening to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set up .bctx/, the default template and git hooks
    Init,

    /// Sync the context of the current branch
    Sync,

    /// Called by the post-checkout hook
    #[command(hide = true)]
    OnCheckout {
        /// Branch checked out before
        old_branch: String,
        /// Branch checked out now
        new_branch: String,
    },

    /// Called by the post-commit hook
    #[command(hide = true)]
    OnCommit,

    /// List or prune branch contexts
    Branches {
        #[command(subcommand)]
        action: BranchesAction,
    },

    /// Show setup and run health checks
    Status,

    /// Reset the current context from a template (destructive)
    Template {
        /// Template name under .bctx/templates/
        name: Option<String>,
    },

    /// Show or set the base branch of the current context
    Base {
        /// New base ref, e.g. origin/develop
        base: Option<String>,
    },

    /// Remove the git hooks
    Uninstall {
        /// Unset the global core.hooksPath instead
        #[arg(long)]
        global: bool,
    },

    /// Print a shell completion script
    Completion {
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum BranchesAction {
    /// List branch contexts
    List,
    /// Archive contexts whose branch no longer exists
    Prune,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "branchctx=debug,bctx=debug"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run(command: Command, cwd: &Path) -> branchctx::Result<bool> {
    match command {
        Command::Init => commands::init(cwd)?,
        Command::Sync => commands::sync(cwd)?,
        Command::OnCheckout {
            old_branch,
            new_branch,
        } => commands::on_checkout(cwd, &old_branch, &new_branch)?,
        Command::OnCommit => commands::on_commit(cwd)?,
        Command::Branches { action } => match action {
            BranchesAction::List => commands::list(cwd)?,
            BranchesAction::Prune => commands::prune(cwd)?,
        },
        Command::Status => return commands::status(cwd),
        Command::Template { name } => commands::template(cwd, name.as_deref())?,
        Command::Base { base } => commands::base(cwd, base.as_deref())?,
        Command::Uninstall { global } => commands::uninstall(cwd, global)?,
        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), CLI_NAME, &mut io::stdout());
        }
    }
    Ok(true)
}

fn main() -> ExitCode {
    // Usage errors exit 1 like every other failure; help and version exit 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    let result = std::env::current_dir()
        .map_err(|e| Error::io(".", e))
        .and_then(|cwd| run(cli.command, &cwd));

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            println!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
