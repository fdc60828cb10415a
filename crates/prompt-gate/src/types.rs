//! Request and verdict types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat identity of the sender of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(pub i64);

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One inbound prompt submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// `None` when the platform delivered the event without a user.
    pub sender: Option<SenderId>,
    pub raw_text: String,
}

impl Request {
    pub fn new(sender: Option<SenderId>, raw_text: impl Into<String>) -> Self {
        Self {
            sender,
            raw_text: raw_text.into(),
        }
    }
}

/// Prompt text that passed the gate.
///
/// Only [`crate::Gatekeeper::evaluate`] constructs this, so holding one proves
/// the sender was authorized and the length bound held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedPrompt {
    quoted: String,
    literal: String,
    char_count: usize,
}

impl SanitizedPrompt {
    pub(crate) fn new(literal: &str, char_count: usize) -> Self {
        Self {
            quoted: crate::shell::quote(literal),
            literal: literal.to_string(),
            char_count,
        }
    }

    /// The prompt as one single-quoted shell word.
    pub fn quoted(&self) -> &str {
        &self.quoted
    }

    /// The accepted prompt text, unquoted. Only for argument-vector use.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }
}

/// Why a prompt was not usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidInput {
    Empty,
    TooLong { chars: usize, max: usize },
    ContainsNul,
}

/// Rejection taxonomy of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Sender is not the allowed identity. Never answered.
    Unauthorized,
    /// Authorized sender, unusable text. Answered with a correctable message.
    InvalidInput(InvalidInput),
}

impl RejectionKind {
    /// Stable machine-readable code for the audit log.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidInput(InvalidInput::Empty) => "invalid_input_empty",
            Self::InvalidInput(InvalidInput::TooLong { .. }) => "invalid_input_too_long",
            Self::InvalidInput(InvalidInput::ContainsNul) => "invalid_input_nul",
        }
    }

    /// Message for the sender, or `None` when the rejection must stay silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Unauthorized => None,
            Self::InvalidInput(InvalidInput::Empty) => Some("Prompt is empty".to_string()),
            Self::InvalidInput(InvalidInput::TooLong { max, .. }) => Some(format!(
                "Prompt exceeds maximum length of {max} characters"
            )),
            Self::InvalidInput(InvalidInput::ContainsNul) => {
                Some("Prompt contains a NUL character".to_string())
            }
        }
    }
}

/// Outcome of [`crate::Gatekeeper::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed(SanitizedPrompt),
    Rejected(RejectionKind),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    pub fn rejection(&self) -> Option<RejectionKind> {
        match self {
            Self::Allowed(_) => None,
            Self::Rejected(kind) => Some(*kind),
        }
    }

    /// Text to send back to the chat, if any.
    pub fn user_message(&self) -> Option<String> {
        self.rejection().and_then(|kind| kind.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_has_no_user_message() {
        assert_eq!(RejectionKind::Unauthorized.user_message(), None);
        assert_eq!(Verdict::Rejected(RejectionKind::Unauthorized).user_message(), None);
    }

    #[test]
    fn too_long_message_names_the_limit() {
        let kind = RejectionKind::InvalidInput(InvalidInput::TooLong { chars: 6000, max: 5000 });
        let message = kind.user_message().unwrap();
        assert!(message.contains("maximum length"));
        assert!(message.contains("5000"));
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            RejectionKind::Unauthorized.code(),
            RejectionKind::InvalidInput(InvalidInput::Empty).code(),
            RejectionKind::InvalidInput(InvalidInput::TooLong { chars: 2, max: 1 }).code(),
            RejectionKind::InvalidInput(InvalidInput::ContainsNul).code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn sender_id_displays_as_plain_number() {
        assert_eq!(SenderId(123456789).to_string(), "123456789");
        assert_eq!(serde_json::to_string(&SenderId(-42)).unwrap(), "-42");
    }
}
