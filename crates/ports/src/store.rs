//! Durable byte store port.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::PortsError;

/// An open read stream over a stored object.
pub type ReadStream = Pin<Box<dyn AsyncRead + Send>>;

/// Path-addressed blob storage shared by every node of a cluster.
///
/// Paths are opaque to the runtime: it only obtains them from
/// [`random_file_path`](Self::random_file_path) or from the user and hands
/// them back unchanged.
#[async_trait]
pub trait Store: Send + Sync {
    /// Human-readable store name, used in error context.
    fn name(&self) -> &str;

    /// Allocate a fresh, unused path under `directory`.
    fn random_file_path(&self, directory: &str) -> String;

    /// Open `path` for reading from the first byte.
    async fn begin_read(&self, path: &str) -> Result<ReadStream, PortsError> {
        self.begin_read_at(path, 0).await
    }

    /// Open `path` for reading starting at byte `offset`.
    async fn begin_read_at(&self, path: &str, offset: u64) -> Result<ReadStream, PortsError>;

    /// Write `data` as the whole content of `path`. Returns bytes written.
    async fn write(&self, path: &str, data: Bytes) -> Result<u64, PortsError>;

    /// Whether `path` exists.
    async fn file_exists(&self, path: &str) -> Result<bool, PortsError>;

    /// Size of `path` in bytes.
    async fn file_size(&self, path: &str) -> Result<u64, PortsError>;

    /// Delete `path`. Deleting a missing path is not an error.
    async fn delete_file(&self, path: &str) -> Result<(), PortsError>;
}
