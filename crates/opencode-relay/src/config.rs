//! Configuration for the relay.
//!
//! Values come from command-line flags with environment fallbacks (a `.env`
//! file is loaded first by the binary). [`RelayConfig::from_args`] turns them
//! into one immutable config; nothing below it reads the environment.

use crate::error::{RelayError, RelayResult};
use clap::Parser;
use prompt_gate::{GateConfig, SenderId, DEFAULT_MAX_PROMPT_CHARS};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use terminal_launcher::{
    LaunchMode, LauncherConfig, DEFAULT_ASSISTANT_PROGRAM, DEFAULT_DISPLAY,
    DEFAULT_SHELL_PROGRAM, DEFAULT_TERMINAL_PROGRAM,
};
use url::Url;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Relay secrets kept out of the launched terminal's environment.
const WITHHELD_ENV: &[&str] = &["BOT_TOKEN"];

/// OpenCode relay: launch OpenCode on this desktop from a Telegram Mini App.
#[derive(Parser, Debug, Clone)]
#[command(name = "opencode-relay", version)]
#[command(about = "Launch OpenCode in a desktop terminal from a Telegram Mini App")]
pub struct CliArgs {
    /// Bot token from @BotFather.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// The only Telegram user ID allowed to use the bot.
    #[arg(long, env = "ALLOWED_USER_ID")]
    pub allowed_user_id: Option<i64>,

    /// HTTPS URL of the Mini App page.
    #[arg(long, env = "MINI_APP_URL")]
    pub mini_app_url: Option<String>,

    /// Directory the terminal opens in. Defaults to the home directory.
    #[arg(long, env = "WORKING_DIR")]
    pub working_dir: Option<PathBuf>,

    /// X display the terminal window is placed on.
    #[arg(long, env = "DISPLAY", default_value = DEFAULT_DISPLAY)]
    pub display: String,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// JSON log file. Defaults to ~/.opencode/bot.log.
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Audit log (JSON lines). Defaults to ~/.opencode/audit.jsonl.
    #[arg(long, env = "AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Maximum prompt length in characters.
    #[arg(long, env = "MAX_PROMPT_LENGTH", default_value_t = DEFAULT_MAX_PROMPT_CHARS)]
    pub max_prompt_length: usize,

    #[arg(long, env = "TERMINAL_PROGRAM", default_value = DEFAULT_TERMINAL_PROGRAM)]
    pub terminal_program: String,

    #[arg(long, env = "ASSISTANT_PROGRAM", default_value = DEFAULT_ASSISTANT_PROGRAM)]
    pub assistant_program: String,

    #[arg(long, env = "SHELL_PROGRAM", default_value = DEFAULT_SHELL_PROGRAM)]
    pub shell_program: String,

    /// `shell-chain` keeps a shell open after OpenCode exits; `direct` runs
    /// OpenCode without an inner shell.
    #[arg(long, env = "LAUNCH_MODE", default_value = "shell-chain")]
    pub launch_mode: LaunchMode,

    /// Long-poll timeout for getUpdates, in seconds.
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value_t = DEFAULT_POLL_TIMEOUT_SECS)]
    pub poll_timeout_secs: u64,

    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_TELEGRAM_API_URL)]
    pub telegram_api_url: String,

    /// Also write human-readable logs to stderr.
    #[arg(long)]
    pub stderr: bool,
}

/// Validated relay configuration.
#[derive(Clone)]
pub struct RelayConfig {
    pub bot_token: String,
    pub gate: GateConfig,
    pub launcher: LauncherConfig,
    pub mini_app_url: Url,
    pub telegram_api_url: Url,
    pub poll_timeout: Duration,
    pub log_level: String,
    pub log_file: PathBuf,
    pub audit_log: PathBuf,
    pub log_to_stderr: bool,
}

impl RelayConfig {
    /// Validate the raw arguments. `home` fills in the default paths.
    pub fn from_args(args: CliArgs, home: Option<PathBuf>) -> RelayResult<Self> {
        let bot_token = args
            .bot_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RelayError::Config("BOT_TOKEN is not set".to_string()))?;

        let allowed_user_id = match args.allowed_user_id {
            None | Some(0) => {
                return Err(RelayError::Config(
                    "ALLOWED_USER_ID is not set".to_string(),
                ))
            }
            Some(id) => SenderId(id),
        };

        let mini_app_url = args
            .mini_app_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| RelayError::Config("MINI_APP_URL is not set".to_string()))?;
        let mini_app_url = Url::parse(mini_app_url.trim())
            .map_err(|e| RelayError::Config(format!("MINI_APP_URL is not a valid URL: {e}")))?;
        if mini_app_url.scheme() != "https" {
            return Err(RelayError::Config(
                "MINI_APP_URL must use https (Telegram refuses other Web App URLs)".to_string(),
            ));
        }

        let telegram_api_url = Url::parse(args.telegram_api_url.trim()).map_err(|e| {
            RelayError::Config(format!("TELEGRAM_API_URL is not a valid URL: {e}"))
        })?;

        if args.max_prompt_length == 0 {
            return Err(RelayError::Config(
                "MAX_PROMPT_LENGTH must be greater than zero".to_string(),
            ));
        }

        let home_or = |what: &str| {
            home.clone().ok_or_else(|| {
                RelayError::Config(format!(
                    "could not determine the home directory; set {what} explicitly"
                ))
            })
        };

        let working_dir = match args.working_dir {
            Some(dir) => dir,
            None => home_or("WORKING_DIR")?,
        };
        let log_file = match args.log_file {
            Some(path) => path,
            None => home_or("LOG_FILE")?.join(".opencode").join("bot.log"),
        };
        let audit_log = match args.audit_log {
            Some(path) => path,
            None => home_or("AUDIT_LOG")?.join(".opencode").join("audit.jsonl"),
        };

        let mut launcher = LauncherConfig::new(working_dir, args.display);
        launcher.terminal_program = args.terminal_program;
        launcher.assistant_program = args.assistant_program;
        launcher.shell_program = args.shell_program;
        launcher.mode = args.launch_mode;
        launcher.withheld_env = WITHHELD_ENV.iter().map(|name| name.to_string()).collect();

        let gate = GateConfig {
            allowed_sender: allowed_user_id,
            max_prompt_chars: args.max_prompt_length,
        };

        Ok(Self {
            bot_token,
            gate,
            launcher,
            mini_app_url,
            telegram_api_url,
            poll_timeout: Duration::from_secs(args.poll_timeout_secs),
            log_level: args.log_level,
            log_file,
            audit_log,
            log_to_stderr: args.stderr,
        })
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bot_token", &"<redacted>")
            .field("gate", &self.gate)
            .field("launcher", &self.launcher)
            .field("mini_app_url", &self.mini_app_url.as_str())
            .field("telegram_api_url", &self.telegram_api_url.as_str())
            .field("poll_timeout", &self.poll_timeout)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .field("audit_log", &self.audit_log)
            .field("log_to_stderr", &self.log_to_stderr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs {
            bot_token: Some("123456:secret-token".to_string()),
            allowed_user_id: Some(42),
            mini_app_url: Some("https://example.github.io/opencode-app/".to_string()),
            working_dir: None,
            display: DEFAULT_DISPLAY.to_string(),
            log_level: "info".to_string(),
            log_file: None,
            audit_log: None,
            max_prompt_length: DEFAULT_MAX_PROMPT_CHARS,
            terminal_program: DEFAULT_TERMINAL_PROGRAM.to_string(),
            assistant_program: DEFAULT_ASSISTANT_PROGRAM.to_string(),
            shell_program: DEFAULT_SHELL_PROGRAM.to_string(),
            launch_mode: LaunchMode::ShellChain,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            stderr: false,
        }
    }

    fn home() -> Option<PathBuf> {
        Some(PathBuf::from("/home/dev"))
    }

    fn config_error(args: CliArgs) -> String {
        match RelayConfig::from_args(args, home()) {
            Err(RelayError::Config(message)) => message,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_follow_home_directory() {
        let config = RelayConfig::from_args(args(), home()).unwrap();

        assert_eq!(config.gate.allowed_sender, SenderId(42));
        assert_eq!(config.gate.max_prompt_chars, 5000);
        assert_eq!(config.launcher.working_dir, PathBuf::from("/home/dev"));
        assert_eq!(config.launcher.display, ":0");
        assert_eq!(config.launcher.terminal_program, "konsole");
        assert_eq!(config.launcher.withheld_env, vec!["BOT_TOKEN".to_string()]);
        assert_eq!(config.log_file, PathBuf::from("/home/dev/.opencode/bot.log"));
        assert_eq!(config.audit_log, PathBuf::from("/home/dev/.opencode/audit.jsonl"));
        assert_eq!(config.poll_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_home_needs_explicit_paths() {
        let mut args = args();
        args.working_dir = Some(PathBuf::from("/srv/code"));

        let err = RelayConfig::from_args(args, None).unwrap_err();
        assert!(err.to_string().contains("LOG_FILE"));
    }

    #[test]
    fn test_explicit_paths_need_no_home() {
        let mut args = args();
        args.working_dir = Some(PathBuf::from("/srv/code"));
        args.log_file = Some(PathBuf::from("/var/log/relay.log"));
        args.audit_log = Some(PathBuf::from("/var/log/relay-audit.jsonl"));
        args.launch_mode = LaunchMode::Direct;
        args.max_prompt_length = 200;

        let config = RelayConfig::from_args(args, None).unwrap();
        assert_eq!(config.launcher.working_dir, PathBuf::from("/srv/code"));
        assert_eq!(config.launcher.mode, LaunchMode::Direct);
        assert_eq!(config.gate.max_prompt_chars, 200);
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut args = args();
        args.bot_token = Some("   ".to_string());
        assert!(config_error(args).contains("BOT_TOKEN"));
    }

    #[test]
    fn test_missing_or_zero_user_id_is_fatal() {
        let mut missing = args();
        missing.allowed_user_id = None;
        assert!(config_error(missing).contains("ALLOWED_USER_ID"));

        let mut zero = args();
        zero.allowed_user_id = Some(0);
        assert!(config_error(zero).contains("ALLOWED_USER_ID"));
    }

    #[test]
    fn test_mini_app_url_is_validated() {
        let mut missing = args();
        missing.mini_app_url = None;
        assert!(config_error(missing).contains("MINI_APP_URL"));

        let mut garbage = args();
        garbage.mini_app_url = Some("not a url".to_string());
        assert!(config_error(garbage).contains("not a valid URL"));

        let mut plain_http = args();
        plain_http.mini_app_url = Some("http://example.com/app".to_string());
        assert!(config_error(plain_http).contains("https"));
    }

    #[test]
    fn test_zero_max_length_is_fatal() {
        let mut args = args();
        args.max_prompt_length = 0;
        assert!(config_error(args).contains("MAX_PROMPT_LENGTH"));
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let config = RelayConfig::from_args(args(), home()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::try_parse_from([
            "opencode-relay",
            "--bot-token",
            "1:abc",
            "--allowed-user-id",
            "42",
            "--mini-app-url",
            "https://example.com/app",
            "--launch-mode",
            "direct",
            "--stderr",
        ])
        .unwrap();

        assert_eq!(args.allowed_user_id, Some(42));
        assert_eq!(args.launch_mode, LaunchMode::Direct);
        assert!(args.stderr);
    }
}
