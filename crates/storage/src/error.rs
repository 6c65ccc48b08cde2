//! Storage error types.

use cumulus_cache::CacheError;
use cumulus_ports::PortsError;

/// Errors from cells, sequences and their store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store object does not exist.
    #[error("store object not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// A caller-supplied argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A call to the store failed.
    #[error("transport failure talking to {target}: {source}")]
    Transport {
        /// Store and path addressed.
        target: String,
        /// Underlying port error.
        #[source]
        source: PortsError,
    },

    /// The local cache holds an entry of the wrong type.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl StoreError {
    /// Convenience constructor for [`StoreError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Maps a serializer failure into [`StoreError::Serialization`].
    pub(crate) fn codec(err: PortsError) -> Self {
        match err {
            PortsError::Serialization(message) => Self::Serialization(message),
            other => Self::Serialization(other.to_string()),
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

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_not_found() {
        let err = StoreError::NotFound {
            path: "cumulus/abc".into(),
        };
        assert_eq!(err.to_string(), "store object not found: cumulus/abc");
    }

    #[test]
    fn retryable_follows_transport_source() {
        let err = StoreError::Transport {
            target: "store memory:cumulus/a".into(),
            source: PortsError::Connection("reset".into()),
        };
        assert!(err.is_retryable());
        assert!(!StoreError::invalid_argument("n must be positive").is_retryable());
    }
}
