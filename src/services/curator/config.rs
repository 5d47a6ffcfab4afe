//! Curator configuration.

/// Default cap on operations applied per batch.
pub const DEFAULT_MAX_OPERATIONS: usize = 10;

/// Configuration for the curator engine.
///
/// # Example
///
/// ```rust
/// use agentic_context::services::curator::CuratorConfig;
///
/// let config = CuratorConfig::default();
/// assert_eq!(config.max_operations, 10);
/// assert_eq!(config.with_max_operations(3).max_operations, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CuratorConfig {
    /// Operations beyond this count are dropped from a batch.
    pub max_operations: usize,
}

impl CuratorConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }

    /// Sets the per-batch operation cap.
    #[must_use]
    pub const fn with_max_operations(mut self, max_operations: usize) -> Self {
        self.max_operations = max_operations;
        self
    }
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self::new()
    }
}
