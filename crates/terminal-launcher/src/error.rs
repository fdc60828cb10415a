use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Generic chat reply for any launch failure. Carries no local details.
pub const USER_FACING_FAILURE: &str =
    "❌ Launch failed. Check the bot logs on the desktop for details.";

/// Error taxonomy for terminal launches.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("terminal program `{program}` not found: {reason}")]
    TerminalNotFound { program: String, reason: String },

    #[error("working directory {} is not usable: {source}", path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("display `{display}` is unreachable: {reason}")]
    DisplayUnavailable { display: String, reason: String },

    #[error("failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Stable machine-readable code for the audit log.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TerminalNotFound { .. } => "terminal_not_found",
            Self::WorkingDirectory { .. } => "working_directory",
            Self::DisplayUnavailable { .. } => "display_unavailable",
            Self::SpawnFailed { .. } => "spawn_failed",
        }
    }
}
