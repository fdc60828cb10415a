//! # Terminal launcher
//!
//! Opens a desktop terminal window that runs the coding assistant with one
//! sanitized prompt. Launches are fire-and-forget: [`Launcher::launch`]
//! returns once the OS accepted the spawn and a background task reaps the
//! child.
//!
//! Every argument is passed as its own argv entry; the only place a shell
//! parses anything is the chained command in [`LaunchMode::ShellChain`], and
//! there the prompt is a single-quoted word built by `prompt-gate`.

mod command;
mod config;
mod error;
mod launcher;
pub mod preflight;

pub use command::LaunchCommand;
pub use config::{
    LaunchMode, LauncherConfig, DEFAULT_ASSISTANT_PROGRAM, DEFAULT_DISPLAY, DEFAULT_DONE_MARKER,
    DEFAULT_SHELL_PROGRAM, DEFAULT_TERMINAL_PROGRAM, DEFAULT_X11_SOCKET_DIR,
};
pub use error::{LaunchError, USER_FACING_FAILURE};
pub use launcher::{Launcher, ProcessHandle};
