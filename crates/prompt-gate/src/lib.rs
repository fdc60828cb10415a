//! # Prompt gate
//!
//! Decides whether an inbound chat prompt may reach the local launcher.
//!
//! The gate checks the sender against the single allowed identity, bounds the
//! prompt length, and turns the accepted text into one single-quoted shell
//! word. A [`SanitizedPrompt`] can only come out of [`Gatekeeper::evaluate`],
//! so the launcher's signature alone guarantees no unchecked text is ever
//! spawned.
//!
//! Rejections are values, not errors. `Unauthorized` carries no user-facing
//! text: the bot stays silent towards unknown senders and the attempt only
//! shows up in the audit log.

pub mod audit;
mod gatekeeper;
pub mod shell;
mod types;

pub use audit::{AuditEvent, AuditRecord, AuditSink, MemoryAuditLog};
pub use gatekeeper::{GateConfig, Gatekeeper, DEFAULT_MAX_PROMPT_CHARS};
pub use types::{InvalidInput, RejectionKind, Request, SanitizedPrompt, SenderId, Verdict};
