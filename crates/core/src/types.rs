//! Run-time descriptors for result types.
//!
//! Rust has no first-class type values, so a process records the result
//! type it was submitted with as a [`TypeDescriptor`]: the fully-qualified
//! name produced by [`std::any::type_name`]. Consumers that need a typed
//! handle look the descriptor up in a table of constructors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a concrete result type, recoverable at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDescriptor {
    name: String,
}

impl TypeDescriptor {
    /// Descriptor of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>().to_owned(),
        }
    }

    /// Descriptor from an already-known fully-qualified name.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Fully-qualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name with module paths stripped,
    /// e.g. `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
    pub fn display_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut token = String::new();
        for ch in self.name.chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == ':' {
                token.push(ch);
            } else {
                out.push_str(last_segment(&token));
                token.clear();
                out.push(ch);
            }
        }
        out.push_str(last_segment(&token));
        out
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn descriptor_of_is_stable() {
        assert_eq!(TypeDescriptor::of::<u64>(), TypeDescriptor::of::<u64>());
        assert_ne!(TypeDescriptor::of::<u64>(), TypeDescriptor::of::<i64>());
    }

    #[test]
    fn display_name_strips_paths() {
        assert_eq!(TypeDescriptor::of::<String>().display_name(), "String");
        assert_eq!(
            TypeDescriptor::of::<Vec<String>>().display_name(),
            "Vec<String>"
        );
        assert_eq!(
            TypeDescriptor::of::<(u32, Option<bool>)>().display_name(),
            "(u32, Option<bool>)"
        );
    }

    #[test]
    fn serializes_as_plain_string() {
        let ty = TypeDescriptor::from_name("my::Type");
        assert_eq!(serde_json::to_string(&ty).unwrap(), "\"my::Type\"");
    }
}
