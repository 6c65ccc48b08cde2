#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Store (in-memory)
//!
//! A [`Store`] backed by a `DashMap` of immutable byte buffers. Counts
//! reads and writes so tests can assert how often the store was touched.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use cumulus_ports::{PortsError, ReadStream, Store};
use dashmap::DashMap;

/// In-memory object store.
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    files: DashMap<String, Bytes>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Empty store called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: DashMap::new(),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of reads opened so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored objects.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Whether an object exists at `path`. Not counted as a read.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Raw bytes at `path`. Not counted as a read.
    pub fn contents(&self, path: &str) -> Option<Bytes> {
        self.files.get(path).map(|entry| entry.value().clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

fn not_found(path: &str) -> PortsError {
    PortsError::not_found("store object", path)
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn random_file_path(&self, directory: &str) -> String {
        let directory = directory.trim_end_matches('/');
        format!("{directory}/{}", uuid::Uuid::new_v4())
    }

    async fn begin_read_at(&self, path: &str, offset: u64) -> Result<ReadStream, PortsError> {
        let bytes = self.contents(path).ok_or_else(|| not_found(path))?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(bytes.len());
        Ok(Box::pin(Cursor::new(bytes.slice(start..))))
    }

    async fn write(&self, path: &str, data: Bytes) -> Result<u64, PortsError> {
        let len = data.len() as u64;
        self.files.insert(path.to_owned(), data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(store = %self.name, path, bytes = len, "wrote object");
        Ok(len)
    }

    async fn file_exists(&self, path: &str) -> Result<bool, PortsError> {
        Ok(self.contains(path))
    }

    async fn file_size(&self, path: &str) -> Result<u64, PortsError> {
        self.files
            .get(path)
            .map(|entry| entry.value().len() as u64)
            .ok_or_else(|| not_found(path))
    }

    async fn delete_file(&self, path: &str) -> Result<(), PortsError> {
        self.files.remove(path);
        Ok(())
    }
}
