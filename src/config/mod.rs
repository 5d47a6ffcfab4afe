//! Configuration management.
//!
//! [`AgenticContextConfig`] is built once at startup and handed to the
//! engines that need it. Values come from, lowest to highest precedence:
//! built-in defaults, a TOML file, then environment variables.
//!
//! # Config File Locations
//!
//! 1. `--config <path>` on the command line
//! 2. `AGENTIC_CONTEXT_CONFIG_PATH`
//! 3. Platform config dir (`~/.config/agentic-context/config.toml` on Linux)
//!
//! # Example
//!
//! ```toml
//! project_dir = "/work/my-project"
//!
//! [curator]
//! max_operations = 10
//!
//! [dedup]
//! enabled = true
//! threshold = 0.85
//!
//! [logging]
//! format = "json"
//! file = "/tmp/agentic-context.log"
//! ```

use crate::observability::{DiagnosticWriter, LogFormat, LoggingConfig};
use crate::services::curator::CuratorConfig;
use crate::services::deduplication::DeduplicationConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the project directory.
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "AGENTIC_CONTEXT_CONFIG_PATH";

/// Environment variable selecting the log format (`pretty` or `json`).
pub const LOG_FORMAT_ENV: &str = "AGENTIC_CONTEXT_LOG_FORMAT";

/// Environment variable naming a log file.
pub const LOG_FILE_ENV: &str = "AGENTIC_CONTEXT_LOG_FILE";

/// Per-project state directory, relative to the project directory.
pub const CLAUDE_DIR: &str = ".claude";

/// Playbook file name inside [`CLAUDE_DIR`].
pub const PLAYBOOK_FILE: &str = "playbook.json";

/// Session marker file name inside [`CLAUDE_DIR`].
pub const SESSION_MARKER_FILE: &str = "last_session.txt";

/// Main configuration.
#[derive(Debug, Clone)]
pub struct AgenticContextConfig {
    /// Project directory holding `.claude/`.
    pub project_dir: PathBuf,
    /// Curator engine settings.
    pub curator: CuratorConfig,
    /// Deduplication settings.
    pub dedup: DeduplicationConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Template overriding the default playbook injection text.
    pub template_path: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Project directory.
    pub project_dir: Option<String>,
    /// Injection template path.
    pub template_path: Option<String>,
    /// Curator section.
    pub curator: Option<ConfigFileCurator>,
    /// Dedup section.
    pub dedup: Option<ConfigFileDedup>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Curator section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileCurator {
    /// Maximum operations applied per batch.
    pub max_operations: Option<usize>,
}

/// Dedup section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileDedup {
    /// Enable deduplication.
    pub enabled: Option<bool>,
    /// Similarity threshold.
    pub threshold: Option<f32>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
}

impl Default for AgenticContextConfig {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            curator: CuratorConfig::default(),
            dedup: DeduplicationConfig::default(),
            logging: LoggingConfig::default(),
            template_path: None,
        }
    }
}

impl AgenticContextConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration the way the binary does.
    ///
    /// Reads `explicit_path` if given, else the file named by
    /// `AGENTIC_CONTEXT_CONFIG_PATH`, else the default location; then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed.
    pub fn load(explicit_path: Option<&Path>) -> crate::Result<Self> {
        Self::load_with(explicit_path, |key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed.
    pub fn load_with(
        explicit_path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<Self> {
        let from_env = lookup(CONFIG_PATH_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let base = match explicit_path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        Ok(base.with_env_overrides(lookup))
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the platform config directory.
    ///
    /// Returns defaults if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs
            .config_dir()
            .join("agentic-context")
            .join("config.toml");
        if platform_config.exists() {
            match Self::load_from_file(&platform_config) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(error = %e, "Ignoring unreadable config file"),
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `AgenticContextConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(project_dir) = file.project_dir {
            config.project_dir = PathBuf::from(project_dir);
        }
        config.template_path = file.template_path.map(PathBuf::from);
        if let Some(max) = file.curator.and_then(|c| c.max_operations) {
            config.curator = config.curator.with_max_operations(max);
        }
        if let Some(dedup) = file.dedup {
            if let Some(enabled) = dedup.enabled {
                config.dedup = config.dedup.with_enabled(enabled);
            }
            if let Some(threshold) = dedup.threshold {
                config.dedup = config.dedup.with_threshold(threshold);
            }
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = parse_log_format(&format, config.logging.format);
            }
            config.logging.file = logging.file.map(PathBuf::from);
            config.logging.filter = logging.filter;
        }

        config
    }

    /// Applies environment overrides read through `lookup`.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(PROJECT_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.project_dir = PathBuf::from(dir);
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            self.logging.format = parse_log_format(&format, self.logging.format);
        }
        if let Some(file) = lookup(LOG_FILE_ENV).filter(|f| !f.trim().is_empty()) {
            self.logging.file = Some(PathBuf::from(file));
        }
        self.dedup = self.dedup.with_env_overrides(&lookup);
        self
    }

    /// Sets the project directory.
    #[must_use]
    pub fn with_project_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_dir = path.into();
        self
    }

    /// `<project>/.claude`.
    #[must_use]
    pub fn claude_dir(&self) -> PathBuf {
        self.project_dir.join(CLAUDE_DIR)
    }

    /// `<project>/.claude/playbook.json`.
    #[must_use]
    pub fn playbook_path(&self) -> PathBuf {
        self.claude_dir().join(PLAYBOOK_FILE)
    }

    /// `<project>/.claude/last_session.txt`.
    #[must_use]
    pub fn session_marker_path(&self) -> PathBuf {
        self.claude_dir().join(SESSION_MARKER_FILE)
    }

    /// Diagnostic writer, if diagnostic mode is enabled for the project.
    #[must_use]
    pub fn diagnostics(&self) -> Option<DiagnosticWriter> {
        DiagnosticWriter::from_claude_dir(&self.claude_dir())
    }
}

fn parse_log_format(value: &str, current: LogFormat) -> LogFormat {
    LogFormat::parse(value).unwrap_or_else(|| {
        tracing::warn!(format = value, "Unknown log format, keeping {}", current.as_str());
        current
    })
}

/// The home directory, or `.` if it cannot be determined.
fn default_project_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::deduplication::DEDUP_THRESHOLD_ENV;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = AgenticContextConfig::new().with_project_dir("/work/p");
        assert_eq!(config.curator.max_operations, 10);
        assert!(config.dedup.enabled);
        assert_eq!(config.playbook_path(), PathBuf::from("/work/p/.claude/playbook.json"));
        assert_eq!(
            config.session_marker_path(),
            PathBuf::from("/work/p/.claude/last_session.txt")
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
project_dir = "/from/file"
template_path = "/tmp/template.md"

[curator]
max_operations = 4

[dedup]
enabled = false
threshold = 0.7

[logging]
format = "json"
filter = "agentic_context=info"
"#,
        );

        let config = AgenticContextConfig::load_from_file(&path).unwrap();
        assert_eq!(config.project_dir, PathBuf::from("/from/file"));
        assert_eq!(config.template_path, Some(PathBuf::from("/tmp/template.md")));
        assert_eq!(config.curator.max_operations, 4);
        assert!(!config.dedup.enabled);
        assert!((config.dedup.threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter.as_deref(), Some("agentic_context=info"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "max_results = 3\n");
        assert!(AgenticContextConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AgenticContextConfig::load_with(
            Some(Path::new("/nonexistent/agentic-context.toml")),
            |_| None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_env_beats_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "project_dir = \"/from/file\"\n[dedup]\nthreshold = 0.7\n");
        let path_str = path.to_string_lossy().into_owned();

        let config = AgenticContextConfig::load_with(None, |key| match key {
            CONFIG_PATH_ENV => Some(path_str.clone()),
            PROJECT_DIR_ENV => Some("/from/env".to_string()),
            DEDUP_THRESHOLD_ENV => Some("0.9".to_string()),
            LOG_FORMAT_ENV => Some("json".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.project_dir, PathBuf::from("/from/env"));
        assert!((config.dedup.threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_file_threshold_survives_without_env() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[dedup]\nthreshold = 0.7\n");
        let config = AgenticContextConfig::load_with(Some(&path), |_| None).unwrap();
        assert!((config.dedup.threshold - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bad_log_format_keeps_current() {
        let config = AgenticContextConfig::new().with_env_overrides(|key| {
            (key == LOG_FORMAT_ENV).then(|| "xml".to_string())
        });
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
