//! Code dependency loading port.

use async_trait::async_trait;
use cumulus_execution::Dependency;

use crate::error::PortsError;

/// Result of loading one dependency into the local process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Loaded and usable.
    Loaded(Dependency),
    /// Present but failed to load.
    LoadFault(Dependency, String),
    /// Not available locally.
    NotLoaded(Dependency),
}

impl LoadOutcome {
    /// The dependency this outcome is about.
    #[must_use]
    pub fn dependency(&self) -> &Dependency {
        match self {
            Self::Loaded(dep) | Self::LoadFault(dep, _) | Self::NotLoaded(dep) => dep,
        }
    }

    /// Returns `true` for [`LoadOutcome::Loaded`].
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Makes the code a process was submitted with available locally.
#[async_trait]
pub trait DependencyLoader: Send + Sync {
    /// Fetch `dependencies` from the cluster.
    async fn download(&self, dependencies: &[Dependency]) -> Result<(), PortsError>;

    /// Load `dependencies`, one outcome per input in the same order.
    async fn load(&self, dependencies: &[Dependency]) -> Result<Vec<LoadOutcome>, PortsError>;
}
