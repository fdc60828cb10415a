//! Launcher configuration.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_TERMINAL_PROGRAM: &str = "konsole";
pub const DEFAULT_ASSISTANT_PROGRAM: &str = "opencode";
pub const DEFAULT_SHELL_PROGRAM: &str = "bash";
pub const DEFAULT_DISPLAY: &str = ":0";
pub const DEFAULT_DONE_MARKER: &str = "--- Done ---";
pub const DEFAULT_X11_SOCKET_DIR: &str = "/tmp/.X11-unix";

/// How the assistant is started inside the terminal window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMode {
    /// `terminal -e shell -c "assistant '<prompt>'; echo <marker>; exec shell"`.
    /// The window stays open on an interactive shell after the assistant exits.
    #[default]
    ShellChain,
    /// `terminal --hold -e assistant <prompt>`. No shell parses the prompt;
    /// the terminal itself keeps the window open.
    Direct,
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShellChain => f.write_str("shell-chain"),
            Self::Direct => f.write_str("direct"),
        }
    }
}

impl FromStr for LaunchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shell-chain" | "shell_chain" | "shell" => Ok(Self::ShellChain),
            "direct" => Ok(Self::Direct),
            other => Err(format!(
                "unknown launch mode `{other}` (expected `shell-chain` or `direct`)"
            )),
        }
    }
}

/// Everything the launcher needs, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Terminal emulator, bare name (looked up on the search path) or path.
    pub terminal_program: String,
    /// Assistant started inside the terminal. Never derived from input.
    pub assistant_program: String,
    /// Shell used for the chained command in [`LaunchMode::ShellChain`].
    pub shell_program: String,
    pub working_dir: PathBuf,
    /// X display the window is placed on, passed as `DISPLAY`.
    pub display: String,
    /// Printed after the assistant exits in [`LaunchMode::ShellChain`].
    pub done_marker: String,
    pub mode: LaunchMode,
    /// Directory holding the local X server sockets (`X0`, `X1`, ...).
    pub x11_socket_dir: PathBuf,
    /// Directories searched for a bare terminal name. `None` reads `PATH`.
    pub search_path: Option<OsString>,
    /// Variables of this process the terminal must not inherit.
    pub withheld_env: Vec<String>,
}

impl LauncherConfig {
    pub fn new(working_dir: PathBuf, display: impl Into<String>) -> Self {
        Self {
            terminal_program: DEFAULT_TERMINAL_PROGRAM.to_string(),
            assistant_program: DEFAULT_ASSISTANT_PROGRAM.to_string(),
            shell_program: DEFAULT_SHELL_PROGRAM.to_string(),
            working_dir,
            display: display.into(),
            done_marker: DEFAULT_DONE_MARKER.to_string(),
            mode: LaunchMode::default(),
            x11_socket_dir: PathBuf::from(DEFAULT_X11_SOCKET_DIR),
            search_path: None,
            withheld_env: Vec::new(),
        }
    }
}
