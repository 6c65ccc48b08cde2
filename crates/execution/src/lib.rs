#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Execution
//!
//! The state model of a remote computation ("process") as seen from a
//! client node.
//!
//! This crate models data only, it never talks to the cluster. It defines:
//!
//! - [`ProcessStatus`] — process-level lifecycle (6 states, 4 terminal)
//! - [`ExecutionTime`] — `NotStarted → Started → Finished` timing
//! - [`ProcessState`] — status, timing and work-item counters
//! - [`ProcessInfo`] and [`Dependency`] — immutable submission metadata
//! - [`ProcessSnapshot`] — point-in-time projection into local wall-clock time
//! - Monotonic reconciliation of stale observations in [`ProcessState::reconcile`]
//! - Status transitions validated by the [`transition`] module

pub mod error;
pub mod info;
pub mod snapshot;
pub mod state;
pub mod status;
pub mod time;
pub mod transition;

pub use error::ExecutionError;
pub use info::{Dependency, ProcessInfo};
pub use snapshot::ProcessSnapshot;
pub use state::ProcessState;
pub use status::ProcessStatus;
pub use time::ExecutionTime;

/// Serde helper for `Duration` serialized as milliseconds.
pub(crate) mod serde_duration {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    /// Serialize a `Duration` as an integer of milliseconds.
    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (duration.as_millis() as u64).serialize(s)
    }

    /// Deserialize an integer of milliseconds into a `Duration`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Serde helper for `Option<Duration>` serialized as milliseconds.
pub(crate) mod serde_duration_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    /// Serialize an `Option<Duration>` as an optional integer of milliseconds.
    pub fn serialize<S: Serializer>(duration: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => (d.as_millis() as u64).serialize(s),
            None => s.serialize_none(),
        }
    }

    /// Deserialize an optional integer of milliseconds into `Option<Duration>`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let opt: Option<u64> = Option::deserialize(d)?;
        Ok(opt.map(Duration::from_millis))
    }
}
