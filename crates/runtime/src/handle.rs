//! Typed process handles and their untyped projection.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use cumulus_cache::StaleCache;
use cumulus_core::{LogEntry, ProcessId, RuntimeId, TypeDescriptor};
use cumulus_execution::{ProcessInfo, ProcessSnapshot, ProcessState, ProcessStatus};
use cumulus_ports::{ProcessEntry, ProcessResult, RuntimeManager};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::config::HandleConfig;
use crate::error::{RuntimeError, entry_target, log_target};
use crate::logs::{LogFeed, LogSubscription};
use crate::serialized::SerializedProcessHandle;

/// Client-side handle to a remote process producing a `T`.
///
/// Status accessors read a [`StaleCache`] of [`ProcessSnapshot`]s, so they
/// reflect the state as of the last refresh rather than the instantaneous
/// remote truth. Each refresh is folded into the previous state with
/// [`ProcessState::reconcile`], so status and timing never move backwards.
///
/// A handle serializes as a [`SerializedProcessHandle`] and is rebuilt with
/// [`SerializedProcessHandle::rehydrate`].
pub struct ProcessHandle<T> {
    entry: Arc<dyn ProcessEntry>,
    manager: Arc<dyn RuntimeManager>,
    status: StaleCache<ProcessSnapshot, RuntimeError>,
    logs: LogFeed,
    _result: PhantomData<fn() -> T>,
}

impl<T> ProcessHandle<T> {
    /// Bind a handle to `entry`, reachable through `manager`.
    pub fn new(
        entry: Arc<dyn ProcessEntry>,
        manager: Arc<dyn RuntimeManager>,
        config: &HandleConfig,
    ) -> Self {
        let status = status_cache(Arc::clone(&entry), config.status_refresh_interval);
        Self {
            entry,
            manager,
            status,
            logs: LogFeed::new(),
            _result: PhantomData,
        }
    }

    /// Process identifier.
    pub fn id(&self) -> ProcessId {
        self.entry.id()
    }

    /// Immutable submission metadata.
    pub fn info(&self) -> &ProcessInfo {
        self.entry.info()
    }

    /// User-supplied name, if any.
    pub fn name(&self) -> Option<&str> {
        self.info().name.as_deref()
    }

    /// Human-readable name of the result type the process was submitted with.
    pub fn return_type_name(&self) -> &str {
        &self.info().return_type_name
    }

    /// Id of the runtime this handle talks to.
    pub fn runtime_id(&self) -> RuntimeId {
        self.manager.id()
    }

    /// Snapshot as of the last refresh. The first call waits for a fetch.
    pub async fn snapshot(&self) -> Result<ProcessSnapshot, RuntimeError> {
        self.status.get().await
    }

    /// Fetch a fresh snapshot now.
    pub async fn refresh(&self) -> Result<ProcessSnapshot, RuntimeError> {
        self.status.refresh().await
    }

    /// Lifecycle status.
    pub async fn status(&self) -> Result<ProcessStatus, RuntimeError> {
        Ok(self.snapshot().await?.state.status)
    }

    /// Work items currently executing.
    pub async fn active_work_items(&self) -> Result<u64, RuntimeError> {
        Ok(self.snapshot().await?.state.active_work_items)
    }

    /// Work items that completed.
    pub async fn completed_work_items(&self) -> Result<u64, RuntimeError> {
        Ok(self.snapshot().await?.state.completed_work_items)
    }

    /// Work items that faulted.
    pub async fn faulted_work_items(&self) -> Result<u64, RuntimeError> {
        Ok(self.snapshot().await?.state.faulted_work_items)
    }

    /// Work items scheduled so far.
    pub async fn total_work_items(&self) -> Result<u64, RuntimeError> {
        Ok(self.snapshot().await?.state.total_work_items)
    }

    /// Local start time, once started.
    pub async fn start_time(&self) -> Result<Option<DateTime<Local>>, RuntimeError> {
        Ok(self.snapshot().await?.start_time)
    }

    /// Time spent executing as of the last refresh.
    pub async fn execution_time(&self) -> Result<Option<Duration>, RuntimeError> {
        Ok(self.snapshot().await?.execution_time)
    }

    /// Local completion time, once finished.
    pub async fn completion_time(&self) -> Result<Option<DateTime<Local>>, RuntimeError> {
        Ok(self.snapshot().await?.completion_time)
    }

    /// Signal cancellation. Returns immediately; observe [`status`](Self::status)
    /// to see it take effect.
    pub fn cancel(&self) {
        tracing::debug!(process_id = %self.id(), "cancellation requested");
        self.entry.cancel();
    }

    /// Subscribe to new log entries. The first call binds the upstream feed.
    pub async fn subscribe_logs(&self) -> Result<LogSubscription, RuntimeError> {
        self.logs.subscribe(&self.manager, self.id()).await
    }

    /// Whether a live log feed has been bound for this handle.
    pub fn is_log_feed_bound(&self) -> bool {
        self.logs.is_bound()
    }

    /// Every log entry recorded for the process so far.
    pub async fn get_logs(&self) -> Result<Vec<LogEntry>, RuntimeError> {
        let process_id = self.id();
        self.manager
            .log_manager()
            .all_logs(process_id)
            .await
            .map_err(|source| RuntimeError::transport(log_target(process_id), source))
    }

    /// Recorded log entries matching `filter`.
    pub async fn get_logs_filtered(
        &self,
        filter: impl Fn(&LogEntry) -> bool,
    ) -> Result<Vec<LogEntry>, RuntimeError> {
        let mut logs = self.get_logs().await?;
        logs.retain(|entry| filter(entry));
        Ok(logs)
    }

    /// Wait for the untyped result, up to `timeout` if given.
    pub async fn await_boxed(&self, timeout: Option<Duration>) -> Result<Value, RuntimeError> {
        let process_id = self.id();
        let pending = self.entry.await_result();
        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| RuntimeError::Timeout {
                    process_id,
                    timeout: limit,
                })?,
            None => pending.await,
        };
        let outcome =
            outcome.map_err(|source| RuntimeError::transport(entry_target(process_id), source))?;
        into_value(process_id, outcome)
    }

    /// The untyped result if the process is terminal.
    pub async fn try_get_boxed(&self) -> Result<Option<Value>, RuntimeError> {
        let process_id = self.id();
        self.entry
            .try_get_result()
            .await
            .map_err(|source| RuntimeError::transport(entry_target(process_id), source))?
            .map(|outcome| into_value(process_id, outcome))
            .transpose()
    }

    /// The serializable form of this handle.
    pub fn to_serialized(&self) -> SerializedProcessHandle {
        SerializedProcessHandle {
            runtime_id: self.runtime_id(),
            process_id: self.id(),
            info: self.info().clone(),
        }
    }
}

impl<T: DeserializeOwned> ProcessHandle<T> {
    /// Wait for the result, up to `timeout` if given.
    ///
    /// A timeout leaves the process running.
    pub async fn await_result(&self, timeout: Option<Duration>) -> Result<T, RuntimeError> {
        decode(self.await_boxed(timeout).await?)
    }

    /// The result if the process has completed, `None` while it runs.
    pub async fn try_get_result(&self) -> Result<Option<T>, RuntimeError> {
        self.try_get_boxed().await?.map(decode).transpose()
    }
}

fn status_cache(
    entry: Arc<dyn ProcessEntry>,
    interval: Duration,
) -> StaleCache<ProcessSnapshot, RuntimeError> {
    let last = Arc::new(Mutex::new(None::<ProcessState>));
    StaleCache::from_fn(
        move || {
            let entry = Arc::clone(&entry);
            let last = Arc::clone(&last);
            async move {
                let observed = entry
                    .get_state()
                    .await
                    .map_err(|source| RuntimeError::transport(entry_target(entry.id()), source))?;
                let state = {
                    let mut last = last.lock();
                    let merged = ProcessState::reconcile(last.as_ref(), observed);
                    *last = Some(merged.clone());
                    merged
                };
                Ok(ProcessSnapshot::project(
                    entry.info().clone(),
                    state,
                    Utc::now(),
                ))
            }
        },
        interval,
    )
}

fn into_value(process_id: ProcessId, outcome: ProcessResult) -> Result<Value, RuntimeError> {
    match outcome {
        ProcessResult::Completed(value) => Ok(value),
        ProcessResult::UserException(message) => Err(RuntimeError::UserException {
            process_id,
            message,
        }),
        ProcessResult::Faulted(message) => Err(RuntimeError::Faulted {
            process_id,
            message,
        }),
        ProcessResult::Canceled => Err(RuntimeError::Cancelled { process_id }),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RuntimeError> {
    serde_json::from_value(value).map_err(|source| RuntimeError::TypeMismatch {
        expected: std::any::type_name::<T>(),
        source,
    })
}

impl<T> Serialize for ProcessHandle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_serialized().serialize(serializer)
    }
}

impl<T> fmt::Debug for ProcessHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.id())
            .field("runtime_id", &self.runtime_id())
            .field("result", &std::any::type_name::<T>())
            .finish()
    }
}

/// Object-safe view of a [`ProcessHandle`] whose result type is only known
/// at run time.
///
/// Recover the typed handle with [`downcast_handle`].
#[async_trait]
pub trait AnyProcessHandle: Send + Sync {
    /// Process identifier.
    fn id(&self) -> ProcessId;

    /// Immutable submission metadata.
    fn info(&self) -> &ProcessInfo;

    /// Id of the runtime the handle talks to.
    fn runtime_id(&self) -> RuntimeId;

    /// Descriptor of the type the handle decodes results into.
    fn result_type(&self) -> TypeDescriptor;

    /// Snapshot as of the last refresh.
    async fn snapshot(&self) -> Result<ProcessSnapshot, RuntimeError>;

    /// Lifecycle status as of the last refresh.
    async fn status(&self) -> Result<ProcessStatus, RuntimeError> {
        Ok(self.snapshot().await?.state.status)
    }

    /// Wait for the untyped result, up to `timeout` if given.
    async fn await_boxed_result(&self, timeout: Option<Duration>) -> Result<Value, RuntimeError>;

    /// The untyped result if the process is terminal.
    async fn try_get_boxed_result(&self) -> Result<Option<Value>, RuntimeError>;

    /// Signal cancellation.
    fn cancel(&self);

    /// Every log entry recorded so far.
    async fn get_logs(&self) -> Result<Vec<LogEntry>, RuntimeError>;

    /// Subscribe to new log entries.
    async fn subscribe_logs(&self) -> Result<LogSubscription, RuntimeError>;

    /// The serializable form of the handle.
    fn to_serialized(&self) -> SerializedProcessHandle;

    /// Borrow as `Any` for downcasting to `ProcessHandle<T>`.
    fn as_any(&self) -> &dyn Any;

    /// Convert into `Any` for owned downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

#[async_trait]
impl<T: DeserializeOwned + 'static> AnyProcessHandle for ProcessHandle<T> {
    fn id(&self) -> ProcessId {
        Self::id(self)
    }

    fn info(&self) -> &ProcessInfo {
        Self::info(self)
    }

    fn runtime_id(&self) -> RuntimeId {
        Self::runtime_id(self)
    }

    fn result_type(&self) -> TypeDescriptor {
        TypeDescriptor::of::<T>()
    }

    async fn snapshot(&self) -> Result<ProcessSnapshot, RuntimeError> {
        Self::snapshot(self).await
    }

    async fn await_boxed_result(&self, timeout: Option<Duration>) -> Result<Value, RuntimeError> {
        self.await_boxed(timeout).await
    }

    async fn try_get_boxed_result(&self) -> Result<Option<Value>, RuntimeError> {
        self.try_get_boxed().await
    }

    fn cancel(&self) {
        Self::cancel(self);
    }

    async fn get_logs(&self) -> Result<Vec<LogEntry>, RuntimeError> {
        Self::get_logs(self).await
    }

    async fn subscribe_logs(&self) -> Result<LogSubscription, RuntimeError> {
        Self::subscribe_logs(self).await
    }

    fn to_serialized(&self) -> SerializedProcessHandle {
        Self::to_serialized(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Recover the typed handle behind `handle`, or `None` if it decodes
/// results into a different type.
pub fn downcast_handle<T: DeserializeOwned + 'static>(
    handle: Arc<dyn AnyProcessHandle>,
) -> Option<Arc<ProcessHandle<T>>> {
    handle.into_any().downcast::<ProcessHandle<T>>().ok()
}
