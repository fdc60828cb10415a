//! Checks run before every spawn so each failure mode is reported distinctly.

use crate::error::LaunchError;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

/// Locate `program` the way `execvp` would.
///
/// Names containing a `/` are taken as paths; bare names are searched in
/// `search_path` (a `PATH`-style list).
pub fn resolve_program(program: &str, search_path: Option<&OsStr>) -> Result<PathBuf, LaunchError> {
    let not_found = |reason: String| LaunchError::TerminalNotFound {
        program: program.to_string(),
        reason,
    };

    if program.is_empty() {
        return Err(not_found("program name is empty".to_string()));
    }

    if program.contains('/') {
        let path = PathBuf::from(program);
        return if is_executable_file(&path) {
            Ok(path)
        } else {
            Err(not_found("no executable file at that path".to_string()))
        };
    }

    let Some(search_path) = search_path else {
        return Err(not_found("PATH is not set".to_string()));
    };

    std::env::split_paths(search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable_file(candidate))
        .ok_or_else(|| not_found("not found on PATH".to_string()))
}

/// The working directory must exist, be a directory, and be listable.
pub fn check_working_dir(path: &Path) -> Result<(), LaunchError> {
    let wrap = |source: io::Error| LaunchError::WorkingDirectory {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(wrap)?;
    if !metadata.is_dir() {
        return Err(wrap(io::Error::other("not a directory")));
    }
    std::fs::read_dir(path).map_err(wrap)?;
    Ok(())
}

/// Check that a local X display has a server socket.
///
/// `:N` and `:N.S` map to `<socket_dir>/XN`. Displays naming a host are
/// remote and are not probed.
pub fn check_display(display: &str, socket_dir: &Path) -> Result<(), LaunchError> {
    let unavailable = |reason: String| LaunchError::DisplayUnavailable {
        display: display.to_string(),
        reason,
    };

    let target = display.trim();
    if target.is_empty() {
        return Err(unavailable("display target is empty".to_string()));
    }

    let Some(local) = target.strip_prefix(':') else {
        tracing::debug!(display = target, "remote display, skipping socket probe");
        return Ok(());
    };

    let number = local.split('.').next().unwrap_or_default();
    let number: u32 = number
        .parse()
        .map_err(|_| unavailable("malformed display number".to_string()))?;

    let socket = socket_dir.join(format!("X{number}"));
    if socket.exists() {
        Ok(())
    } else {
        Err(unavailable(format!(
            "no X server socket at {}",
            socket.display()
        )))
    }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
