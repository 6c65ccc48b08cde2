//! Lazily bound live log feed of a process handle.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use cumulus_core::{LogEntry, ProcessId};
use cumulus_ports::RuntimeManager;
use futures::stream::{BoxStream, Stream, StreamExt};
use tokio::sync::{OnceCell, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{RuntimeError, log_target};

const FEED_CAPACITY: usize = 1024;

struct Upstream {
    // The forwarder owns the only strong sender, so receivers see `Closed`
    // once the poller ends.
    sender: broadcast::WeakSender<LogEntry>,
    _forwarder: DropGuard,
}

/// One upstream poller per handle, fanned out to any number of
/// subscriptions. Bound on first subscribe; the forwarding task stops when
/// the feed is dropped. Once the upstream poller ends, existing
/// subscriptions drain and end, and later ones end immediately.
#[derive(Default)]
pub(crate) struct LogFeed {
    upstream: OnceCell<Upstream>,
}

impl LogFeed {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.upstream.initialized()
    }

    pub(crate) async fn subscribe(
        &self,
        manager: &Arc<dyn RuntimeManager>,
        process_id: ProcessId,
    ) -> Result<LogSubscription, RuntimeError> {
        let upstream = self
            .upstream
            .get_or_try_init(|| bind(manager, process_id))
            .await?;
        Ok(match upstream.sender.upgrade() {
            Some(sender) => LogSubscription::new(process_id, sender.subscribe()),
            None => {
                tracing::debug!(%process_id, "log feed already closed");
                LogSubscription::closed(process_id)
            }
        })
    }
}

async fn bind(
    manager: &Arc<dyn RuntimeManager>,
    process_id: ProcessId,
) -> Result<Upstream, RuntimeError> {
    let mut poller = manager
        .log_manager()
        .log_poller(process_id)
        .await
        .map_err(|source| RuntimeError::transport(log_target(process_id), source))?;
    let (forward, _) = broadcast::channel(FEED_CAPACITY);
    let sender = forward.downgrade();
    let stop = CancellationToken::new();

    let stopped = stop.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = stopped.cancelled() => break,
                next = poller.next() => match next {
                    Some(entry) => {
                        let _ = forward.send(entry);
                    }
                    None => break,
                },
            }
        }
        drop(forward);
        tracing::debug!(%process_id, "log feed closed");
    });
    tracing::debug!(%process_id, "log feed bound");

    Ok(Upstream {
        sender,
        _forwarder: stop.drop_guard(),
    })
}

/// A cancelable stream of a process's log entries.
///
/// Yields entries appended after the subscription was created, in the
/// backend's append order. Ends when [`cancel`](Self::cancel) is called,
/// when the upstream feed closes, or when dropped.
pub struct LogSubscription {
    process_id: ProcessId,
    entries: BoxStream<'static, LogEntry>,
    cancel: CancellationToken,
}

impl LogSubscription {
    fn new(process_id: ProcessId, receiver: broadcast::Receiver<LogEntry>) -> Self {
        let entries = BroadcastStream::new(receiver)
            .filter_map(move |item| async move {
                match item {
                    Ok(entry) => Some(entry),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        tracing::warn!(%process_id, skipped, "log subscriber lagged, entries dropped");
                        None
                    }
                }
            })
            .boxed();
        Self::from_entries(process_id, entries)
    }

    fn closed(process_id: ProcessId) -> Self {
        Self::from_entries(process_id, futures::stream::empty().boxed())
    }

    fn from_entries(process_id: ProcessId, entries: BoxStream<'static, LogEntry>) -> Self {
        let cancel = CancellationToken::new();
        let entries = entries
            .take_until(cancel.clone().cancelled_owned())
            .boxed();
        Self {
            process_id,
            entries,
            cancel,
        }
    }

    /// Process the entries belong to.
    pub fn process_id(&self) -> ProcessId {
        self.process_id
    }

    /// Stop the subscription. The stream ends at its next poll.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for LogSubscription {
    type Item = LogEntry;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.entries.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for LogSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSubscription")
            .field("process_id", &self.process_id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
