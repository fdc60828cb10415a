//! OpenCode relay binary entry point.
//!
//! Usage: opencode-relay [--stderr] [--working-dir <dir>] ...
//!
//! Settings are read from flags, the environment, and a `.env` file in the
//! current directory, in that order of precedence.

use clap::Parser;
use opencode_relay::{
    CliArgs, JsonlAuditLog, Relay, RelayConfig, RelayError, RelayResult, TelegramClient,
};
use prompt_gate::{AuditSink, Gatekeeper};
use std::process::ExitCode;
use std::sync::Arc;
use terminal_launcher::Launcher;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let config = match RelayConfig::from_args(args, dirs::home_dir()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("opencode-relay: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = observability::init_with_config(observability::LogConfig {
        service_name: "opencode-relay".into(),
        default_level: config.log_level.clone(),
        log_path: Some(config.log_file.clone()),
        also_stderr: config.log_to_stderr,
    }) {
        eprintln!(
            "opencode-relay: cannot open log file {}: {e}",
            config.log_file.display()
        );
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Relay exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: RelayConfig) -> RelayResult<()> {
    info!(
        allowed_sender = %config.gate.allowed_sender,
        mini_app_url = %config.mini_app_url,
        working_dir = %config.launcher.working_dir.display(),
        display = %config.launcher.display,
        terminal = %config.launcher.terminal_program,
        mode = %config.launcher.mode,
        log_file = %config.log_file.display(),
        audit_log = %config.audit_log.display(),
        "Configuration loaded"
    );

    let audit: Arc<dyn AuditSink> = Arc::new(JsonlAuditLog::open(&config.audit_log)?);

    let launcher = Launcher::new(config.launcher.clone());
    match launcher.preflight() {
        Ok(terminal) => info!(terminal = %terminal.display(), "Launch preflight passed"),
        Err(e) => warn!(
            error = %e,
            code = e.code(),
            "Launch preflight failed; launches will fail until this is fixed"
        ),
    }

    let client = TelegramClient::new(
        &config.telegram_api_url,
        &config.bot_token,
        config.poll_timeout,
    )?;
    let me = client.get_me().await?;
    info!(
        bot = me.username.as_deref().unwrap_or(&me.first_name),
        "Connected to Telegram"
    );
    client.delete_webhook(true).await?;

    let gatekeeper = Gatekeeper::new(config.gate, audit.clone());
    let mut relay = Relay::new(
        client,
        gatekeeper,
        launcher,
        audit,
        config.mini_app_url.as_str(),
    );

    tokio::select! {
        result = relay.run() => result,
        signal = shutdown_signal() => {
            signal?;
            info!("Received shutdown signal, exiting...");
            Ok(())
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> RelayResult<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).map_err(RelayError::Io)?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map_err(RelayError::Io),
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> RelayResult<()> {
    tokio::signal::ctrl_c().await.map_err(RelayError::Io)
}
