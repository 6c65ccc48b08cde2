#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Ports
//!
//! Collaborator interface traits (ports) for the Cumulus runtime.
//!
//! The runtime core never talks to a cluster, a file store or a serializer
//! directly. It consumes them through the **port** traits defined here and
//! backend drivers implement them:
//!
//! - [`Store`] -- durable byte storage addressed by path
//! - [`Serializer`] -- value and record-stream codec
//! - [`ProcessEntry`] / [`ProcessDirectory`] -- remote process references
//! - [`LogManager`] -- per-process log retrieval
//! - [`DependencyLoader`] -- "ensure code is loaded" step
//! - [`TypeCodec`] -- (un)pickling of result type descriptors
//! - [`RuntimeManager`] -- the entry point bundling the cluster-side services
//!
//! All traits are object-safe, suitable for use as `Arc<dyn Trait>` behind
//! dependency injection.

pub mod codec;
pub mod dependencies;
pub mod directory;
pub mod error;
pub mod logs;
pub mod manager;
pub mod process;
pub mod serializer;
pub mod store;

pub use codec::{JsonTypeCodec, TypeCodec};
pub use dependencies::{DependencyLoader, LoadOutcome};
pub use directory::ProcessDirectory;
pub use error::PortsError;
pub use logs::{LogManager, LogStream};
pub use manager::RuntimeManager;
pub use process::{ProcessEntry, ProcessResult};
pub use serializer::{RecordStream, Serializer};
pub use store::{ReadStream, Store};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time test: if it compiles, the traits are object-safe.
    #[test]
    fn traits_are_object_safe() {
        fn _assert_store(_: &dyn Store) {}
        fn _assert_serializer(_: &dyn Serializer) {}
        fn _assert_entry(_: &dyn ProcessEntry) {}
        fn _assert_directory(_: &dyn ProcessDirectory) {}
        fn _assert_logs(_: &dyn LogManager) {}
        fn _assert_loader(_: &dyn DependencyLoader) {}
        fn _assert_codec(_: &dyn TypeCodec) {}
        fn _assert_manager(_: &dyn RuntimeManager) {}
    }

    /// Verify traits can be wrapped in `Arc` for shared ownership.
    #[test]
    fn traits_work_as_arc_dyn() {
        use std::sync::Arc;
        fn _takes_store(_: Arc<dyn Store>) {}
        fn _takes_serializer(_: Arc<dyn Serializer>) {}
        fn _takes_entry(_: Arc<dyn ProcessEntry>) {}
        fn _takes_manager(_: Arc<dyn RuntimeManager>) {}
    }

    #[test]
    fn trait_objects_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Store>();
        assert_send_sync::<dyn Serializer>();
        assert_send_sync::<dyn ProcessEntry>();
        assert_send_sync::<dyn RuntimeManager>();
    }
}
