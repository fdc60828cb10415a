//! Append-only line writer.
//!
//! Every write goes to a file opened with `O_APPEND` and is flushed before the
//! lock is released, so lines from concurrent writers never interleave and
//! each line is visible to `tail -f` immediately.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Shared append-only file writer. Clones write to the same file.
#[derive(Clone)]
pub struct AppendWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
    path: PathBuf,
}

impl AppendWriter {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `line` plus a trailing newline as one locked write.
    pub fn append_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.inner.lock();
        guard.write_all(line.as_bytes())?;
        guard.write_all(b"\n")?;
        guard.flush()
    }
}

impl io::Write for AppendWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let result = guard.write(buf);
        guard.flush()?;
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// MakeWriter implementation for tracing-subscriber.
#[derive(Clone)]
pub struct WriterFactory {
    writer: AppendWriter,
}

impl WriterFactory {
    pub fn new(writer: AppendWriter) -> Self {
        Self { writer }
    }
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = AppendWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}
