//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Environment variable holding filter directives.
pub const LOG_FILTER_ENV: &str = "STAGEPRUNE_LOG";

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "STAGEPRUNE_LOG_FORMAT";

/// Environment variable naming a log file.
pub const LOG_FILE_ENV: &str = "STAGEPRUNE_LOG_FILE";

const DEFAULT_DIRECTIVES: &str = "info";
const VERBOSE_DIRECTIVES: &str = "stageprune=debug,info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives.
    pub directives: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional file to append to instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directives: DEFAULT_DIRECTIVES.to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// Filter precedence: `STAGEPRUNE_LOG`, `RUST_LOG`, `--verbose`, the
    /// config file `level`, then `info`.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::from_sources(settings, verbose, |key| std::env::var(key).ok())
    }

    fn from_sources<F>(settings: Option<&LoggingSettings>, verbose: bool, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let directives = non_empty(LOG_FILTER_ENV)
            .or_else(|| non_empty("RUST_LOG"))
            .or_else(|| verbose.then(|| VERBOSE_DIRECTIVES.to_string()))
            .or_else(|| settings.and_then(|s| s.level.clone()))
            .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string());

        let format = non_empty(LOG_FORMAT_ENV)
            .or_else(|| settings.and_then(|s| s.format.clone()))
            .map_or_else(LogFormat::default, |value| LogFormat::parse(&value));

        let file = non_empty(LOG_FILE_ENV)
            .map(PathBuf::from)
            .or_else(|| settings.and_then(|s| s.file.clone()));

        Self {
            directives,
            format,
            file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = LoggingConfig::from_sources(None, false, env_from(&[]));
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_verbose_enables_debug() {
        let config = LoggingConfig::from_sources(None, true, env_from(&[]));
        assert_eq!(config.directives, VERBOSE_DIRECTIVES);
    }

    #[test]
    fn test_env_filter_wins_over_settings() {
        let settings = LoggingSettings {
            level: Some("warn".to_string()),
            format: Some("json".to_string()),
            file: None,
        };
        let config = LoggingConfig::from_sources(
            Some(&settings),
            true,
            env_from(&[(LOG_FILTER_ENV, "trace"), ("RUST_LOG", "error")]),
        );

        assert_eq!(config.directives, "trace");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_settings_used_when_env_blank() {
        let settings = LoggingSettings {
            level: Some("warn".to_string()),
            format: None,
            file: Some(PathBuf::from("/tmp/stageprune.log")),
        };
        let config =
            LoggingConfig::from_sources(Some(&settings), false, env_from(&[("RUST_LOG", " ")]));

        assert_eq!(config.directives, "warn");
        assert_eq!(config.file, Some(PathBuf::from("/tmp/stageprune.log")));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("unknown"), LogFormat::Pretty);
    }
}
