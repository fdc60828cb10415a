use crate::command::LaunchCommand;
use crate::config::LauncherConfig;
use crate::error::LaunchError;
use crate::preflight::{check_display, check_working_dir, resolve_program};
use prompt_gate::SanitizedPrompt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Reference to a spawned terminal. The launcher keeps no other state for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: Option<u32>,
}

/// Starts a terminal window running the assistant for one prompt.
#[derive(Debug, Clone)]
pub struct Launcher {
    config: LauncherConfig,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Build the invocation without running it.
    pub fn build_command(&self, prompt: &SanitizedPrompt) -> LaunchCommand {
        LaunchCommand::build(&self.config, prompt)
    }

    /// Run every pre-spawn check and return the resolved terminal path.
    pub fn preflight(&self) -> Result<PathBuf, LaunchError> {
        let search_path = self
            .config
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"));
        let terminal = resolve_program(&self.config.terminal_program, search_path.as_deref())?;
        check_working_dir(&self.config.working_dir)?;
        check_display(&self.config.display, &self.config.x11_socket_dir)?;
        Ok(terminal)
    }

    /// Spawn the terminal and return as soon as the OS accepted it.
    ///
    /// The child runs in its own process group with all three standard
    /// streams on `/dev/null`, so it outlives the caller. A background task
    /// reaps it and logs how it exited; that never affects the result. Must be
    /// called inside a Tokio runtime.
    pub async fn launch(&self, prompt: &SanitizedPrompt) -> Result<ProcessHandle, LaunchError> {
        let terminal = self.preflight_blocking().await?;
        let command = self.build_command(prompt);

        debug!(
            terminal = %terminal.display(),
            args = command.args.len(),
            withheld_env = command.env_remove.len(),
            mode = %self.config.mode,
            "spawning terminal"
        );

        let child = spawn(&terminal, &command).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LaunchError::TerminalNotFound {
                    program: command.program.clone(),
                    reason: source.to_string(),
                }
            } else {
                LaunchError::SpawnFailed {
                    program: command.program.clone(),
                    source,
                }
            }
        })?;

        let pid = child.id();
        info!(pid = ?pid, "terminal launched");
        tokio::spawn(watch_exit(child, pid));

        Ok(ProcessHandle { pid })
    }

    /// [`Launcher::preflight`] on the blocking pool; it walks the filesystem.
    async fn preflight_blocking(&self) -> Result<PathBuf, LaunchError> {
        let launcher = self.clone();
        tokio::task::spawn_blocking(move || launcher.preflight())
            .await
            .map_err(|e| LaunchError::SpawnFailed {
                program: self.config.terminal_program.clone(),
                source: io::Error::other(e),
            })?
    }
}

fn spawn(terminal: &Path, command: &LaunchCommand) -> io::Result<Child> {
    let mut cmd = std::process::Command::new(terminal);
    cmd.args(&command.args)
        .current_dir(&command.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    for key in &command.env_remove {
        cmd.env_remove(key);
    }
    for (key, value) in &command.env {
        cmd.env(key, value);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    Command::from(cmd).kill_on_drop(false).spawn()
}

async fn watch_exit(mut child: Child, pid: Option<u32>) {
    match child.wait().await {
        Ok(status) if status.success() => {
            debug!(pid = ?pid, "terminal exited");
        }
        Ok(status) => {
            warn!(pid = ?pid, status = %status, "terminal exited with failure");
        }
        Err(e) => {
            warn!(pid = ?pid, error = %e, "failed to wait on terminal");
        }
    }
}
