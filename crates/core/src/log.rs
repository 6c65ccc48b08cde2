//! Process log records.
//!
//! A cluster keeps an append-only log per process. Entries are produced on
//! worker nodes and read back through the runtime's log manager.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ProcessId;

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    Info,
    /// Something unexpected that did not stop the work item.
    Warning,
    /// A work item failed.
    Error,
    /// The process as a whole is in trouble.
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A single log record emitted on behalf of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Process that produced the entry.
    pub process_id: ProcessId,
    /// Worker node that produced the entry, if known.
    #[serde(default)]
    pub worker: Option<String>,
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
    /// When the entry was written, in UTC.
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(process_id: ProcessId, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            process_id,
            worker: None,
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Attach the worker that produced the entry.
    #[must_use]
    pub fn with_worker(mut self, worker: impl Into<String>) -> Self {
        self.worker = Some(worker.into());
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level,
            self.message
        )?;
        if let Some(worker) = &self.worker {
            write!(f, " ({worker})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_ordering_follows_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn display_includes_worker_when_present() {
        let entry = LogEntry::new(ProcessId::v4(), LogLevel::Warning, "slow").with_worker("w-1");
        let rendered = entry.to_string();
        assert!(rendered.contains("warning slow"));
        assert!(rendered.ends_with("(w-1)"));
    }

    #[test]
    fn serde_roundtrip() {
        let entry = LogEntry::new(ProcessId::v4(), LogLevel::Error, "boom");
        let json = serde_json::to_string(&entry).unwrap();
        let back: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn level_serializes_snake_case() {
        let json = serde_json::to_string(&LogLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
