//! Unique identifiers for Cumulus entities.
//!
//! Strongly-typed UUID identifiers built on
//! [`domain-key`](https://crates.io/crates/domain-key) `Uuid<D>` wrappers.
//! Each identifier is parameterized by its own domain marker, so a
//! [`ProcessId`] can never be passed where a [`RuntimeId`] is expected.
//!
//! All ID types are `Copy` (16 bytes, stack-allocated) and support:
//! - `v4()` for random UUID generation
//! - `nil()` for zero-valued default
//! - `parse(&str)` for string parsing
//! - Full serde support (serializes as UUID string)
//! - `Display`, `FromStr`, `Eq`, `Ord`, `Hash`

use domain_key::define_uuid;

pub use domain_key::UuidParseError;

// Identifies one remote computation inside a cluster.
define_uuid!(pub ProcessIdDomain => ProcessId);
// Identifies a cluster / runtime manager; the key of the manager registry.
define_uuid!(pub RuntimeIdDomain => RuntimeId);
// Per-instance local cache key of a stored cell or sequence. Never persisted.
define_uuid!(pub ValueIdDomain => ValueId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_id_v4_creates_non_nil_uuid() {
        let id = ProcessId::v4();
        assert!(!id.is_nil());
    }

    #[test]
    fn runtime_id_v4_creates_non_nil_uuid() {
        let id = RuntimeId::v4();
        assert!(!id.is_nil());
    }

    #[test]
    fn value_ids_are_unique_per_call() {
        let a = ValueId::v4();
        let b = ValueId::v4();
        assert_ne!(a, b);
    }

    #[test]
    fn id_parse_valid_uuid_string_succeeds() {
        let id = RuntimeId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn id_parse_invalid_string_returns_error() {
        assert!(ProcessId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn id_serde_json_roundtrip() {
        let id = ProcessId::v4();
        let json = serde_json::to_string(&id).unwrap();
        let back: ProcessId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn id_hash_is_consistent() {
        use std::collections::HashSet;
        let id = RuntimeId::v4();
        let mut set = HashSet::new();
        set.insert(id);
        assert!(set.contains(&id));
    }
}
