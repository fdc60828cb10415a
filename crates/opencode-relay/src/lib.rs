//! OpenCode relay: launch OpenCode on a Linux desktop from a Telegram Mini App.
//!
//! The relay long-polls Telegram, passes every Mini App submission through
//! the [`prompt_gate`] gatekeeper and hands accepted prompts to the
//! [`terminal_launcher`], which opens a terminal window running OpenCode.
//!
//! # Guarantees
//!
//! 1. **Single identity**: only the configured Telegram user gets any reply
//! 2. **Silent refusal**: unknown senders are audit-logged and never answered
//! 3. **Argv only**: prompts reach the terminal as argument-vector entries
//! 4. **No retries**: a failed launch is reported once; the user resubmits
//!
//! # Architecture
//!
//! ```text
//! Telegram -> Relay -> Gatekeeper -> Launcher -> terminal window
//!    ^          |          |            |
//!    |__ reply _|          |__ audit ___|
//! ```

pub mod audit_log;
pub mod config;
pub mod error;
pub mod relay;
pub mod telegram;
pub mod transport;

#[cfg(all(test, unix))]
mod tests;

pub use audit_log::JsonlAuditLog;
pub use config::{CliArgs, RelayConfig};
pub use error::{RelayError, RelayResult};
pub use relay::{Backoff, Outcome, Relay};
pub use telegram::TelegramClient;
pub use transport::{ChatTransport, InboundEvent, OutboundMessage, WebAppButton};
