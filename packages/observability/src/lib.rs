//! # Observability
//!
//! Logging setup shared by the OpenCode relay crates.
//!
//! Services call [`init_with_config`] once at startup and use the standard
//! `tracing` macros everywhere else. When a log path is configured every event
//! is written as one JSON object per line to that file; stderr output is
//! optional and uses the compact formatter.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "opencode-relay".into(),
//!     default_level: "debug".into(),
//!     log_path: Some("/var/log/opencode/bot.log".into()),
//!     also_stderr: true,
//! })?;
//! tracing::info!("ready");
//! ```
//!
//! [`AppendWriter`] is also exported on its own so other append-only files
//! (the audit log) get the same multi-writer guarantees.

mod json_layer;
mod writer;

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{AppendWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSON line.
    pub service_name: String,

    /// Default level filter (e.g. "debug", "info").
    /// `RUST_LOG` takes precedence when set.
    pub default_level: String,

    /// JSONL log file. `None` means stderr only.
    pub log_path: Option<PathBuf>,

    /// Also emit compact human-readable logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize logging with custom configuration.
///
/// Fails if the log file cannot be opened or a global subscriber is
/// already installed.
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    let file_layer = match &config.log_path {
        Some(path) => {
            let writer = AppendWriter::open(path)?;
            let layer = JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer));
            Some(layer.with_filter(env_filter(&config.default_level)))
        }
        None => None,
    };

    // Without a file there is nowhere else to log, so stderr is forced on.
    let stderr_layer = if config.also_stderr || config.log_path.is_none() {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .compact()
                .with_writer(io::stderr)
                .with_filter(env_filter(&config.default_level)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        log_path = ?config.log_path,
        level = %config.default_level,
        "observability initialized"
    );

    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_ascii_lowercase()))
}
