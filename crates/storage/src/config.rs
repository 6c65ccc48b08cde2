//! Store defaults.

use serde::{Deserialize, Serialize};

const DIRECTORY_VAR: &str = "CUMULUS_STORE_DIRECTORY";
const CACHE_VAR: &str = "CUMULUS_CACHE_BY_DEFAULT";

/// Defaults applied when a cell or sequence is created without explicit
/// options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory new objects are written under (default: `"cumulus"`).
    pub default_directory: String,
    /// Whether reads populate the local cache (default: `false`).
    pub cache_by_default: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_directory: "cumulus".to_string(),
            cache_by_default: false,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `CUMULUS_STORE_DIRECTORY` and
    /// `CUMULUS_CACHE_BY_DEFAULT`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(directory) = lookup(DIRECTORY_VAR).filter(|d| !d.trim().is_empty()) {
            config.default_directory = directory;
        }
        if let Some(raw) = lookup(CACHE_VAR) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.cache_by_default = true,
                "0" | "false" | "no" | "off" => config.cache_by_default = false,
                _ => tracing::warn!(key = CACHE_VAR, value = %raw, "ignoring unparseable configuration variable"),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.default_directory, "cumulus");
        assert!(!config.cache_by_default);
    }

    #[rstest]
    #[case("true", true)]
    #[case("ON", true)]
    #[case("0", false)]
    #[case("maybe", false)]
    fn cache_flag_from_vars(#[case] raw: &str, #[case] expected: bool) {
        let config = StoreConfig::from_vars(|key| (key == CACHE_VAR).then(|| raw.to_owned()));
        assert_eq!(config.cache_by_default, expected);
    }

    #[test]
    fn directory_from_vars() {
        let config =
            StoreConfig::from_vars(|key| (key == DIRECTORY_VAR).then(|| "scratch".to_owned()));
        assert_eq!(config.default_directory, "scratch");
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"cache_by_default": true}"#).unwrap();
        assert_eq!(config.default_directory, "cumulus");
        assert!(config.cache_by_default);
    }
}
