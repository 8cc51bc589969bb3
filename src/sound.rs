//! Optional notification sound after a sync.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

/// The player command for this platform, with `file` as its argument.
fn player_command(file: &Path) -> Option<Command> {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("afplay");
        cmd.arg(file);
        Some(cmd)
    } else if cfg!(target_os = "linux") {
        let mut cmd = Command::new("paplay");
        cmd.arg(file);
        Some(cmd)
    } else if cfg!(windows) {
        let mut cmd = Command::new("powershell");
        cmd.arg("-c").arg(format!(
            "(New-Object Media.SoundPlayer '{}').PlaySync()",
            file.display()
        ));
        Some(cmd)
    } else {
        None
    }
}

/// Start playing `file` in the background. Does nothing if it is unset or missing.
///
/// The player is never waited on, so a hook returns immediately.
pub fn play(file: Option<&Path>) {
    let Some(file) = file.filter(|f| f.is_file()) else {
        debug!("no sound file to play");
        return;
    };
    let Some(mut cmd) = player_command(file) else {
        return;
    };

    let spawned = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if let Err(e) = spawned {
        debug!(error = %e, "could not start sound player");
    }
}
