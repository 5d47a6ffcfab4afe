//! Structured logging configuration.

use std::path::PathBuf;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "AGENTIC_CONTEXT_LOG";

/// Filter used when nothing else is configured.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Returns the format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Logging configuration.
///
/// Logs go to stderr unless `file` is set; stdout carries hook responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Append-only log file.
    pub file: Option<PathBuf>,
    /// Filter directive from the config file (e.g. `agentic_context=info`).
    pub filter: Option<String>,
}

impl LoggingConfig {
    /// Resolves the effective filter directive.
    ///
    /// Precedence: `AGENTIC_CONTEXT_LOG`, then `debug` when verbose, then the
    /// configured filter, then `warn`.
    #[must_use]
    pub fn filter_directive(&self, verbose: bool, lookup: impl Fn(&str) -> Option<String>) -> String {
        if let Some(from_env) = lookup(LOG_FILTER_ENV).filter(|v| !v.trim().is_empty()) {
            return from_env;
        }
        if verbose {
            return "debug".to_string();
        }
        self.filter
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("json", Some(LogFormat::Json))]
    #[test_case(" JSON ", Some(LogFormat::Json))]
    #[test_case("pretty", Some(LogFormat::Pretty))]
    #[test_case("text", Some(LogFormat::Pretty))]
    #[test_case("xml", None)]
    fn test_log_format_parse(input: &str, expected: Option<LogFormat>) {
        assert_eq!(LogFormat::parse(input), expected);
    }

    #[test]
    fn test_filter_precedence() {
        let config = LoggingConfig {
            filter: Some("info".to_string()),
            ..LoggingConfig::default()
        };
        let env = |_: &str| Some("trace".to_string());
        let no_env = |_: &str| -> Option<String> { None };

        assert_eq!(config.filter_directive(true, env), "trace");
        assert_eq!(config.filter_directive(true, no_env), "debug");
        assert_eq!(config.filter_directive(false, no_env), "info");
        assert_eq!(
            LoggingConfig::default().filter_directive(false, no_env),
            DEFAULT_LOG_FILTER
        );
    }
}
