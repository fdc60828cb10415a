//! File-backed audit sink.

use observability::AppendWriter;
use prompt_gate::{AuditRecord, AuditSink};
use std::io;
use std::path::Path;

/// Writes each [`AuditRecord`] as one JSON line, appended atomically.
#[derive(Clone)]
pub struct JsonlAuditLog {
    writer: AppendWriter,
}

impl JsonlAuditLog {
    /// Open (or create) the audit file and its parent directories.
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            writer: AppendWriter::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, record: AuditRecord) {
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, request_id = %record.request_id, "failed to serialize audit record");
                return;
            }
        };

        if let Err(e) = self.writer.append_line(&line) {
            tracing::error!(
                error = %e,
                path = %self.writer.path().display(),
                request_id = %record.request_id,
                "failed to append audit record"
            );
        }
    }
}
