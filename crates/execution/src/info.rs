//! Immutable submission metadata of a process.

use std::fmt;

use cumulus_core::ProcessId;
use serde::{Deserialize, Serialize};

/// A code dependency a process was submitted with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: semver::Version,
}

impl Dependency {
    /// Create a dependency reference.
    pub fn new(name: impl Into<String>, version: semver::Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// What a process is: fixed at submission, never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Process identifier.
    pub id: ProcessId,
    /// Optional user-supplied name.
    #[serde(default)]
    pub name: Option<String>,
    /// Encoded descriptor of the result type, decoded by the runtime's type codec.
    pub return_type: String,
    /// Human-readable name of the result type.
    pub return_type_name: String,
    /// Code the process needs loaded to run or to decode its result.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ProcessInfo {
    /// Metadata for an unnamed process without dependencies.
    pub fn new(
        id: ProcessId,
        return_type: impl Into<String>,
        return_type_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: None,
            return_type: return_type.into(),
            return_type_name: return_type_name.into(),
            dependencies: Vec::new(),
        }
    }

    /// Set the user-supplied name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the declared dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dependency_display() {
        let dep = Dependency::new("numeric", semver::Version::new(1, 2, 3));
        assert_eq!(dep.to_string(), "numeric@1.2.3");
    }

    #[test]
    fn builder_sets_optional_fields() {
        let info = ProcessInfo::new(ProcessId::v4(), "u64", "u64")
            .with_name("word-count")
            .with_dependencies(vec![Dependency::new("text", semver::Version::new(0, 1, 0))]);
        assert_eq!(info.name.as_deref(), Some("word-count"));
        assert_eq!(info.dependencies.len(), 1);
    }

    #[test]
    fn serde_roundtrip() {
        let info = ProcessInfo::new(ProcessId::v4(), "\"u64\"", "u64").with_name("p");
        let json = serde_json::to_string(&info).unwrap();
        let back: ProcessInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info, back);
    }

    #[test]
    fn missing_optional_fields_default() {
        let id = ProcessId::v4();
        let json = serde_json::json!({
            "id": id,
            "return_type": "\"u64\"",
            "return_type_name": "u64",
        });
        let info: ProcessInfo = serde_json::from_value(json).unwrap();
        assert_eq!(info.name, None);
        assert!(info.dependencies.is_empty());
    }
}
