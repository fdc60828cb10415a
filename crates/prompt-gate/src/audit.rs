//! Audit records.
//!
//! Every gate decision and every launch attempt produces one [`AuditRecord`].
//! Sinks are append-only and infallible from the caller's point of view: a
//! sink that cannot persist a record reports it through `tracing` and moves
//! on, so auditing never changes a decision.

use crate::types::{RejectionKind, SenderId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
    pub sender: Option<SenderId>,
    #[serde(flatten)]
    pub event: AuditEvent,
}

impl AuditRecord {
    pub fn new(request_id: Uuid, sender: Option<SenderId>, event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id,
            sender,
            event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchOutcome {
    Launched,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    Decision {
        decision: Decision,
        #[serde(skip_serializing_if = "Option::is_none")]
        rejection: Option<String>,
        /// Kept only for unauthorized attempts.
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_text: Option<String>,
        prompt_chars: usize,
    },
    Launch {
        outcome: LaunchOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
    },
}

impl AuditEvent {
    pub fn rejected(kind: RejectionKind, raw_text: &str) -> Self {
        let raw_text = match kind {
            RejectionKind::Unauthorized => Some(raw_text.to_string()),
            RejectionKind::InvalidInput(_) => None,
        };
        Self::Decision {
            decision: Decision::Rejected,
            rejection: Some(kind.code().to_string()),
            raw_text,
            prompt_chars: 0,
        }
    }

    pub fn allowed(prompt_chars: usize) -> Self {
        Self::Decision {
            decision: Decision::Allowed,
            rejection: None,
            raw_text: None,
            prompt_chars,
        }
    }

    pub fn launched(pid: Option<u32>) -> Self {
        Self::Launch {
            outcome: LaunchOutcome::Launched,
            pid,
            error_code: None,
            cause: None,
        }
    }

    pub fn launch_failed(error_code: &str, cause: String) -> Self {
        Self::Launch {
            outcome: LaunchOutcome::Failed,
            pid: None,
            error_code: Some(error_code.to_string()),
            cause: Some(cause),
        }
    }
}

/// Append-only destination for audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// In-process sink. Keeps every record in order.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, record: AuditRecord) {
        self.records.lock().push(record);
    }
}
