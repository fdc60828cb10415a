use crate::audit::{AuditEvent, AuditRecord, AuditSink};
use crate::types::{InvalidInput, RejectionKind, Request, SanitizedPrompt, SenderId, Verdict};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default upper bound on prompt length, in characters.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 5000;

/// Static gate settings, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    pub allowed_sender: SenderId,
    pub max_prompt_chars: usize,
}

impl GateConfig {
    pub fn new(allowed_sender: SenderId) -> Self {
        Self {
            allowed_sender,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}

/// Authorization and sanitization of inbound prompts.
pub struct Gatekeeper {
    config: GateConfig,
    audit: Arc<dyn AuditSink>,
}

impl Gatekeeper {
    pub fn new(config: GateConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self { config, audit }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Whether `sender` is the allowed identity. No audit record.
    pub fn is_allowed(&self, sender: Option<SenderId>) -> bool {
        sender == Some(self.config.allowed_sender)
    }

    /// Decide on one request.
    ///
    /// Checks run in order and stop at the first failure: identity, empty
    /// text, NUL bytes, length. Exactly one audit record is written per call.
    pub fn evaluate(&self, request_id: Uuid, request: &Request) -> Verdict {
        let verdict = self.decide(request);

        let event = match &verdict {
            Verdict::Allowed(prompt) => AuditEvent::allowed(prompt.char_count()),
            Verdict::Rejected(kind) => AuditEvent::rejected(*kind, &request.raw_text),
        };
        self.audit
            .record(AuditRecord::new(request_id, request.sender, event));

        match &verdict {
            Verdict::Rejected(RejectionKind::Unauthorized) => warn!(
                request_id = %request_id,
                sender = ?request.sender,
                "unauthorized prompt attempt"
            ),
            Verdict::Rejected(kind) => debug!(
                request_id = %request_id,
                rejection = kind.code(),
                "prompt rejected"
            ),
            Verdict::Allowed(prompt) => debug!(
                request_id = %request_id,
                prompt_chars = prompt.char_count(),
                "prompt accepted"
            ),
        }

        verdict
    }

    fn decide(&self, request: &Request) -> Verdict {
        if !self.is_allowed(request.sender) {
            return Verdict::Rejected(RejectionKind::Unauthorized);
        }

        let text = request.raw_text.as_str();
        if text.is_empty() {
            return invalid(InvalidInput::Empty);
        }

        if text.contains('\0') {
            return invalid(InvalidInput::ContainsNul);
        }

        let chars = text.chars().count();
        if chars > self.config.max_prompt_chars {
            return invalid(InvalidInput::TooLong {
                chars,
                max: self.config.max_prompt_chars,
            });
        }

        Verdict::Allowed(SanitizedPrompt::new(text, chars))
    }
}

fn invalid(reason: InvalidInput) -> Verdict {
    Verdict::Rejected(RejectionKind::InvalidInput(reason))
}
