#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Log
//!
//! Subscriber bootstrap for the `tracing` events every Cumulus crate emits.
//!
//! ```no_run
//! let _guard = cumulus_log::auto_init().expect("valid log filter");
//! tracing::info!(runtime_id = "r-1", "runtime client registered");
//! ```
//!
//! Library crates never install a subscriber themselves; binaries and tests
//! call one of the `init*` functions once.

pub mod builder;
pub mod config;
pub mod error;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Format, WriterConfig};
pub use error::{LogError, LogResult};

/// Install a subscriber with [`Config::default`].
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Install a subscriber with `config`.
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Install a subscriber configured from the environment when a filter
/// variable is set, otherwise from the development or production preset
/// depending on the build profile.
pub fn auto_init() -> LogResult<LoggerGuard> {
    let config = if config::env_filter_is_set() {
        Config::from_env()
    } else if cfg!(debug_assertions) {
        Config::development()
    } else {
        Config::production()
    };
    init_with(config)
}

/// Install the test preset, writing through the test harness capture.
///
/// Safe to call from every test: only the first call installs anything.
pub fn init_test() -> LoggerGuard {
    init_with(Config::test()).unwrap_or_else(|_| LoggerGuard::noop())
}
