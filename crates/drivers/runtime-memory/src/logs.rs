//! In-memory log manager.

use async_trait::async_trait;
use cumulus_core::{LogEntry, ProcessId};
use cumulus_ports::{LogManager, LogStream, PortsError};
use dashmap::DashMap;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

const FEED_CAPACITY: usize = 256;

struct ProcessLog {
    history: Vec<LogEntry>,
    feed: broadcast::Sender<LogEntry>,
}

impl ProcessLog {
    fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            history: Vec::new(),
            feed,
        }
    }
}

/// Append-only per-process log with a live feed.
#[derive(Default)]
pub struct InMemoryLogs {
    logs: DashMap<ProcessId, ProcessLog>,
}

impl InMemoryLogs {
    /// Empty log store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` to its process log and publish it to live pollers.
    pub fn append(&self, entry: LogEntry) {
        let mut log = self.logs.entry(entry.process_id).or_insert_with(ProcessLog::new);
        let _ = log.feed.send(entry.clone());
        log.history.push(entry);
    }

    /// Number of live pollers for `process_id`.
    pub fn poller_count(&self, process_id: ProcessId) -> usize {
        self.logs
            .get(&process_id)
            .map_or(0, |log| log.feed.receiver_count())
    }

    /// End every live poller of `process_id`. History is kept and new
    /// pollers attach to a fresh feed.
    pub fn close_feed(&self, process_id: ProcessId) {
        if let Some(mut log) = self.logs.get_mut(&process_id) {
            let (feed, _) = broadcast::channel(FEED_CAPACITY);
            log.feed = feed;
        }
    }
}

#[async_trait]
impl LogManager for InMemoryLogs {
    async fn log_poller(&self, process_id: ProcessId) -> Result<LogStream, PortsError> {
        let receiver = self
            .logs
            .entry(process_id)
            .or_insert_with(ProcessLog::new)
            .feed
            .subscribe();
        Ok(BroadcastStream::new(receiver)
            .filter_map(|item| async move { item.ok() })
            .boxed())
    }

    async fn all_logs(&self, process_id: ProcessId) -> Result<Vec<LogEntry>, PortsError> {
        Ok(self
            .logs
            .get(&process_id)
            .map(|log| log.history.clone())
            .unwrap_or_default())
    }
}
