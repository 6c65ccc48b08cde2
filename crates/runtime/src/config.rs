//! Handle and client configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const REFRESH_VAR: &str = "CUMULUS_STATUS_REFRESH_MS";
const PARALLELISM_VAR: &str = "CUMULUS_MAX_PARALLELISM";
const DEFAULT_PARALLELISM: NonZeroUsize = NonZeroUsize::new(8).unwrap();

/// Settings for every [`ProcessHandle`](crate::ProcessHandle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    /// How old a status snapshot may get before a read triggers a refresh
    /// (default: 500 ms).
    #[serde(with = "serde_millis")]
    pub status_refresh_interval: Duration,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            status_refresh_interval: Duration::from_millis(500),
        }
    }
}

impl HandleConfig {
    /// Defaults overridden by `CUMULUS_STATUS_REFRESH_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(ms) = parse_var::<u64>(&lookup, REFRESH_VAR) {
            config.status_refresh_interval = Duration::from_millis(ms);
        }
        config
    }
}

/// Settings for a [`RuntimeClient`](crate::RuntimeClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Entries materialized concurrently when listing a directory
    /// (default: 8).
    pub max_parallelism: NonZeroUsize,
    /// Settings for the handles the client creates.
    pub handle: HandleConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_parallelism: DEFAULT_PARALLELISM,
            handle: HandleConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `CUMULUS_MAX_PARALLELISM` and
    /// `CUMULUS_STATUS_REFRESH_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            handle: HandleConfig::from_vars(&lookup),
            ..Self::default()
        };
        if let Some(parallelism) = parse_var::<NonZeroUsize>(&lookup, PARALLELISM_VAR) {
            config.max_parallelism = parallelism;
        }
        config
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable configuration variable");
            None
        }
    }
}

mod serde_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (duration.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_parallelism.get(), 8);
        assert_eq!(
            config.handle.status_refresh_interval,
            Duration::from_millis(500)
        );
    }

    #[rstest]
    #[case(Some("16"), 16)]
    #[case(Some("0"), 8)]
    #[case(Some("many"), 8)]
    #[case(None, 8)]
    fn parallelism_from_vars(#[case] raw: Option<&str>, #[case] expected: usize) {
        let config = ClientConfig::from_vars(|key| {
            (key == "CUMULUS_MAX_PARALLELISM")
                .then(|| raw.map(str::to_owned))
                .flatten()
        });
        assert_eq!(config.max_parallelism.get(), expected);
    }

    #[test]
    fn refresh_interval_from_vars() {
        let config = ClientConfig::from_vars(|key| {
            (key == "CUMULUS_STATUS_REFRESH_MS").then(|| "125".to_owned())
        });
        assert_eq!(
            config.handle.status_refresh_interval,
            Duration::from_millis(125)
        );
    }

    #[test]
    fn durations_serialize_as_millis() {
        let json = serde_json::to_value(HandleConfig::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "status_refresh_interval": 500 }));
    }

    #[test]
    fn zero_parallelism_is_rejected_by_serde() {
        let result = serde_json::from_str::<ClientConfig>(r#"{"max_parallelism": 0}"#);
        assert!(result.is_err());
    }
}
