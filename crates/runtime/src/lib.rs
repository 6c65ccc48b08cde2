#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Runtime
//!
//! Client-side view of processes running on a Cumulus cluster.
//!
//! This crate provides:
//! - [`ProcessHandle`] -- typed handle with cached status, result awaiting,
//!   cancellation and logs
//! - [`AnyProcessHandle`] -- the same handle with its result type erased
//! - [`SerializedProcessHandle`] -- the form a handle takes between nodes,
//!   and its rehydration
//! - [`ManagerRegistry`] -- process-wide table of live runtime managers
//! - [`HandleFactory`] -- typed handles from run-time type descriptors
//! - [`RuntimeClient`] -- listing, clearing and reporting over one runtime
//!
//! The cluster itself is reached only through the traits in
//! `cumulus-ports`.

pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod handle;
pub mod logs;
pub mod registry;
pub mod report;
pub mod serialized;

pub use client::RuntimeClient;
pub use config::{ClientConfig, HandleConfig};
pub use error::RuntimeError;
pub use factory::HandleFactory;
pub use handle::{AnyProcessHandle, ProcessHandle, downcast_handle};
pub use logs::LogSubscription;
pub use registry::ManagerRegistry;
pub use report::format_report;
pub use serialized::SerializedProcessHandle;
