//! Per-call overrides for creating and binding stored values.

use std::sync::Arc;

use cumulus_ports::Serializer;

use crate::context::StoreContext;

/// Overrides applied when writing a new cell or sequence.
#[derive(Clone, Default)]
pub struct WriteOptions {
    /// Directory to write under instead of the configured default.
    pub directory: Option<String>,
    /// Serializer to use instead of the context's.
    pub serializer: Option<Arc<dyn Serializer>>,
    /// Whether reads populate the local cache.
    pub cache_by_default: Option<bool>,
}

impl WriteOptions {
    /// Write under `directory`.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Encode with `serializer`.
    #[must_use]
    pub fn serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Populate the local cache on read.
    #[must_use]
    pub fn cache_by_default(mut self, enabled: bool) -> Self {
        self.cache_by_default = Some(enabled);
        self
    }

    pub(crate) fn resolve(self, ctx: &StoreContext) -> Resolved {
        Resolved {
            directory: self
                .directory
                .unwrap_or_else(|| ctx.config().default_directory.clone()),
            serializer: self
                .serializer
                .unwrap_or_else(|| Arc::clone(ctx.serializer())),
            cache_by_default: self
                .cache_by_default
                .unwrap_or(ctx.config().cache_by_default),
        }
    }
}

/// Overrides applied when binding to an existing store object.
#[derive(Clone, Default)]
pub struct ReadOptions {
    /// Serializer the object was written with, if not the context's.
    pub serializer: Option<Arc<dyn Serializer>>,
    /// Pay the read cost now instead of on first access.
    pub force: bool,
    /// Whether reads populate the local cache.
    pub cache_by_default: Option<bool>,
}

impl ReadOptions {
    /// Decode with `serializer`.
    #[must_use]
    pub fn serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Read eagerly while binding.
    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Populate the local cache on read.
    #[must_use]
    pub fn cache_by_default(mut self, enabled: bool) -> Self {
        self.cache_by_default = Some(enabled);
        self
    }

    pub(crate) fn resolve(self, ctx: &StoreContext) -> (Arc<dyn Serializer>, bool, bool) {
        (
            self.serializer
                .unwrap_or_else(|| Arc::clone(ctx.serializer())),
            self.force,
            self.cache_by_default
                .unwrap_or(ctx.config().cache_by_default),
        )
    }
}

pub(crate) struct Resolved {
    pub directory: String,
    pub serializer: Arc<dyn Serializer>,
    pub cache_by_default: bool,
}

impl std::fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteOptions")
            .field("directory", &self.directory)
            .field("serializer", &self.serializer.as_ref().map(|s| s.id().to_owned()))
            .field("cache_by_default", &self.cache_by_default)
            .finish()
    }
}

impl std::fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOptions")
            .field("serializer", &self.serializer.as_ref().map(|s| s.id().to_owned()))
            .field("force", &self.force)
            .field("cache_by_default", &self.cache_by_default)
            .finish()
    }
}
