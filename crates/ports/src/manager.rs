//! Runtime manager port.

use std::sync::Arc;

use cumulus_core::RuntimeId;

use crate::codec::TypeCodec;
use crate::dependencies::DependencyLoader;
use crate::directory::ProcessDirectory;
use crate::logs::LogManager;

/// The object through which a node reaches cluster-wide services.
pub trait RuntimeManager: Send + Sync {
    /// Identifier of the cluster this manager talks to.
    fn id(&self) -> RuntimeId;

    /// Process log access.
    fn log_manager(&self) -> Arc<dyn LogManager>;

    /// Process listing and clearing.
    fn process_directory(&self) -> Arc<dyn ProcessDirectory>;

    /// Code dependency loading.
    fn dependency_loader(&self) -> Arc<dyn DependencyLoader>;

    /// Result type descriptor (un)pickling.
    fn type_codec(&self) -> Arc<dyn TypeCodec>;
}
