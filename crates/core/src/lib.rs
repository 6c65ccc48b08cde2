#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Core
//!
//! Core types shared by every Cumulus crate.
//!
//! ## Key Components
//!
//! - **Identifiers**: [`ProcessId`], [`RuntimeId`], [`ValueId`]
//! - **Logs**: [`LogEntry`] and [`LogLevel`], the records a cluster keeps per process
//! - **Type descriptors**: [`TypeDescriptor`], the run-time name of a result type
//!
//! ## Usage
//!
//! ```rust
//! use cumulus_core::{LogEntry, LogLevel, ProcessId, TypeDescriptor};
//!
//! let process = ProcessId::v4();
//! let entry = LogEntry::new(process, LogLevel::Info, "work item started");
//! assert_eq!(entry.process_id, process);
//!
//! let ty = TypeDescriptor::of::<Vec<String>>();
//! assert_eq!(ty.display_name(), "Vec<String>");
//! ```

pub mod id;
pub mod log;
pub mod types;

pub use id::*;
pub use log::{LogEntry, LogLevel};
pub use types::TypeDescriptor;
