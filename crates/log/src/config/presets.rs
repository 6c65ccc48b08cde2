//! Configuration presets for common scenarios

use super::{Config, DisplayConfig, Format, WriterConfig};

const LEVEL_VAR: &str = "CUMULUS_LOG";
const FALLBACK_LEVEL_VAR: &str = "RUST_LOG";
const FORMAT_VAR: &str = "CUMULUS_LOG_FORMAT";
const COLORS_VAR: &str = "CUMULUS_LOG_COLORS";
const SOURCE_VAR: &str = "CUMULUS_LOG_SOURCE";

pub(crate) fn env_filter_is_set() -> bool {
    std::env::var_os(LEVEL_VAR).is_some() || std::env::var_os(FALLBACK_LEVEL_VAR).is_some()
}

impl Config {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// `CUMULUS_LOG` wins over `RUST_LOG`; an unknown `CUMULUS_LOG_FORMAT`
    /// falls back to compact.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup(LEVEL_VAR).or_else(|| lookup(FALLBACK_LEVEL_VAR)) {
            config.level = level;
        }

        if let Some(format) = lookup(FORMAT_VAR) {
            config.format = Format::parse(&format).unwrap_or(Format::Compact);
        }

        if let Some(colors) = lookup(COLORS_VAR).and_then(|v| parse_bool(&v)) {
            config.display.colors = colors;
        }
        if let Some(source) = lookup(SOURCE_VAR).and_then(|v| parse_bool(&v)) {
            config.display.source = source;
        }

        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                colors: true,
                source: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                flatten: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Test configuration (captured by the test harness)
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
            writer: WriterConfig::Test,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_is_default() {
        assert_eq!(Config::from_vars(vars(&[])), Config::default());
    }

    #[test]
    fn cumulus_log_wins_over_rust_log() {
        let config = Config::from_vars(vars(&[
            ("CUMULUS_LOG", "cumulus_runtime=trace"),
            ("RUST_LOG", "warn"),
        ]));
        assert_eq!(config.level, "cumulus_runtime=trace");
    }

    #[test]
    fn rust_log_is_fallback() {
        let config = Config::from_vars(vars(&[("RUST_LOG", "warn")]));
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn format_and_display_flags() {
        let config = Config::from_vars(vars(&[
            ("CUMULUS_LOG_FORMAT", "json"),
            ("CUMULUS_LOG_COLORS", "off"),
            ("CUMULUS_LOG_SOURCE", "1"),
        ]));
        assert_eq!(config.format, Format::Json);
        assert!(!config.display.colors);
        assert!(config.display.source);
    }

    #[test]
    fn unknown_format_is_compact() {
        let config = Config::from_vars(vars(&[("CUMULUS_LOG_FORMAT", "xml")]));
        assert_eq!(config.format, Format::Compact);
    }

    #[test]
    fn presets_differ_where_expected() {
        assert_eq!(Config::development().format, Format::Pretty);
        assert_eq!(Config::production().format, Format::Json);
        assert!(Config::production().display.flatten);
        assert_eq!(Config::test().writer, WriterConfig::Test);
        assert!(!Config::test().display.time);
    }
}
