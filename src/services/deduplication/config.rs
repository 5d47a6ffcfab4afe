//! Deduplication configuration.

/// Default cosine similarity at or above which two entries are duplicates.
pub const DEFAULT_DEDUP_THRESHOLD: f32 = 0.85;

/// Environment variable overriding the similarity threshold.
pub const DEDUP_THRESHOLD_ENV: &str = "AGENTIC_CONTEXT_DEDUP_THRESHOLD";

/// Environment variable disabling deduplication (`false` or `0`).
pub const DEDUP_ENABLED_ENV: &str = "AGENTIC_CONTEXT_DEDUP_ENABLED";

/// Configuration for the deduplication pass.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `AGENTIC_CONTEXT_DEDUP_ENABLED` | bool | `true` | Enable deduplication |
/// | `AGENTIC_CONTEXT_DEDUP_THRESHOLD` | f32 | `0.85` | Similarity threshold, clamped to [0, 1] |
///
/// # Example
///
/// ```rust
/// use agentic_context::services::deduplication::DeduplicationConfig;
///
/// let config = DeduplicationConfig::default();
/// assert!(config.enabled);
/// assert_eq!(config.threshold, 0.85);
/// assert_eq!(config.with_threshold(1.7).threshold, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeduplicationConfig {
    /// Enable/disable the pass entirely.
    pub enabled: bool,
    /// Similarity threshold in [0, 1].
    pub threshold: f32,
}

impl DeduplicationConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_DEDUP_THRESHOLD,
        }
    }

    /// Creates a configuration from environment variables.
    ///
    /// Falls back to defaults for unset or unparseable variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    #[must_use]
    pub fn with_env_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup(DEDUP_ENABLED_ENV)
            .map_or(self.enabled, |v| v.to_lowercase() != "false" && v != "0");
        let threshold = resolve_threshold(None, lookup(DEDUP_THRESHOLD_ENV).as_deref(), self.threshold);
        Self { enabled, threshold }
    }

    /// Sets the threshold, clamped to [0, 1].
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = resolve_threshold(Some(threshold), None, self.threshold);
        self
    }

    /// Enables or disables deduplication.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the similarity threshold.
///
/// Precedence: `explicit`, then a parseable `env_value`, then `fallback`.
/// The result is clamped to [0, 1]; NaN candidates are skipped.
#[must_use]
pub fn resolve_threshold(explicit: Option<f32>, env_value: Option<&str>, fallback: f32) -> f32 {
    let from_env = env_value.and_then(|v| v.trim().parse::<f32>().ok());
    [explicit, from_env, Some(fallback), Some(DEFAULT_DEDUP_THRESHOLD)]
        .into_iter()
        .flatten()
        .find(|t| !t.is_nan())
        .unwrap_or(DEFAULT_DEDUP_THRESHOLD)
        .clamp(0.0, 1.0)
}
