//! Argument-vector construction.

use crate::config::{LaunchMode, LauncherConfig};
use prompt_gate::shell::{quote, quote_word};
use prompt_gate::SanitizedPrompt;
use std::ffi::OsString;
use std::path::PathBuf;

/// A fully built terminal invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Terminal program as configured (argv[0]).
    pub program: String,
    /// Arguments after the program, each passed as its own argv entry.
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    /// Environment set explicitly on the child.
    pub env: Vec<(String, String)>,
    /// Inherited variables removed from the child's environment.
    pub env_remove: Vec<String>,
}

impl LaunchCommand {
    pub fn build(config: &LauncherConfig, prompt: &SanitizedPrompt) -> Self {
        let mut args: Vec<OsString> = vec![
            "--workdir".into(),
            config.working_dir.clone().into_os_string(),
        ];

        match config.mode {
            LaunchMode::ShellChain => {
                args.push("-e".into());
                args.push(config.shell_program.clone().into());
                args.push("-c".into());
                args.push(shell_chain(config, prompt).into());
            }
            LaunchMode::Direct => {
                args.push("--hold".into());
                args.push("-e".into());
                args.push(config.assistant_program.clone().into());
                args.push(prompt.literal().into());
            }
        }

        Self {
            program: config.terminal_program.clone(),
            args,
            working_dir: config.working_dir.clone(),
            env: vec![("DISPLAY".to_string(), config.display.clone())],
            env_remove: config.withheld_env.clone(),
        }
    }

    /// Program followed by its arguments, lossily converted for logs and tests.
    pub fn argv_lossy(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect()
    }
}

/// The inner command string handed to `shell -c`. The prompt is the only
/// part derived from input and is always a single-quoted word.
fn shell_chain(config: &LauncherConfig, prompt: &SanitizedPrompt) -> String {
    format!(
        "{} {}; echo {}; exec {}",
        quote_word(&config.assistant_program),
        prompt.quoted(),
        quote(&config.done_marker),
        quote_word(&config.shell_program),
    )
}
