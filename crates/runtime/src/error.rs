//! Runtime error types.

use std::time::Duration;

use cumulus_core::{ProcessId, RuntimeId};
use cumulus_ports::PortsError;

/// Errors from the runtime layer.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// No manager with this id is registered in the current process.
    #[error("runtime {runtime_id} is not registered")]
    NotRegistered {
        /// The id that was looked up.
        runtime_id: RuntimeId,
    },

    /// Waiting for a result exceeded the caller's deadline. The process
    /// keeps running.
    #[error("process {process_id} did not complete within {timeout:?}")]
    Timeout {
        /// Process that was awaited.
        process_id: ProcessId,
        /// How long was waited.
        timeout: Duration,
    },

    /// The result does not decode as the handle's declared type.
    #[error("result is not a {expected}: {source}")]
    TypeMismatch {
        /// Declared result type.
        expected: &'static str,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },

    /// A call to a remote collaborator failed.
    #[error("transport failure talking to {target}: {source}")]
    Transport {
        /// Which remote entity was addressed.
        target: String,
        /// Underlying port error.
        #[source]
        source: PortsError,
    },

    /// The cluster has no process with this id.
    #[error("process {process_id} not found")]
    ProcessNotFound {
        /// The id that was looked up.
        process_id: ProcessId,
    },

    /// The runtime failed to execute the process.
    #[error("process {process_id} faulted: {message}")]
    Faulted {
        /// Failed process.
        process_id: ProcessId,
        /// Fault description.
        message: String,
    },

    /// User code raised an error.
    #[error("process {process_id} raised: {message}")]
    UserException {
        /// Failed process.
        process_id: ProcessId,
        /// Error description.
        message: String,
    },

    /// The process was canceled before producing a result.
    #[error("process {process_id} was canceled")]
    Cancelled {
        /// Canceled process.
        process_id: ProcessId,
    },

    /// The pickled result type could not be decoded.
    #[error("cannot decode result type of process {process_id}: {source}")]
    TypeDecode {
        /// Process whose type was decoded.
        process_id: ProcessId,
        /// Codec failure.
        #[source]
        source: PortsError,
    },
}

impl RuntimeError {
    /// Wrap a port failure with the remote target it addressed.
    pub fn transport(target: impl Into<String>, source: PortsError) -> Self {
        Self::Transport {
            target: target.into(),
            source,
        }
    }

    /// Whether the underlying failure is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

pub(crate) fn entry_target(process_id: ProcessId) -> String {
    format!("process entry {process_id}")
}

pub(crate) fn directory_target(runtime_id: RuntimeId) -> String {
    format!("process directory {runtime_id}")
}

pub(crate) fn log_target(process_id: ProcessId) -> String {
    format!("log manager for process {process_id}")
}
