//! Playbook rendering for context injection.
//!
//! The playbook is rendered as one block per non-empty section, in canonical
//! order, and substituted into a template at `{key_points}`:
//!
//! ```text
//! ## PATTERNS & APPROACHES
//! [pat-001] helpful=5 harmful=0 :: Run the linter before committing
//!
//! ## OTHERS
//! [oth-001] helpful=0 harmful=0 :: Prefer small commits
//! ```

use crate::models::Playbook;
use crate::{Error, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Placeholder replaced by the rendered key points.
pub const KEY_POINTS_PLACEHOLDER: &str = "{key_points}";

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "\
# Playbook

Key points learned in earlier sessions on this project, grouped by section.
Each line shows how often the point was rated helpful or harmful.
Weigh each point by its helpful/harmful ratio. Treat a point with a high
harmful count with caution, even if it was once helpful.

{key_points}

When a key point above shapes your answer or a change you make, cite its ID
in square brackets, for example [pat-001], so its usefulness can be rated
at the end of the session.
";

/// Renders the key points of a playbook without a template.
///
/// Returns an empty string for an empty playbook.
#[must_use]
pub fn format_key_points(playbook: &Playbook) -> String {
    let mut blocks = Vec::new();
    for (section, entries) in playbook.sections.iter() {
        if entries.is_empty() {
            continue;
        }
        let mut block = format!("## {}", section.name());
        for entry in entries {
            let _ = write!(
                block,
                "\n[{}] helpful={} harmful={} :: {}",
                entry.name, entry.helpful, entry.harmful, entry.text
            );
        }
        blocks.push(block);
    }
    blocks.join("\n\n")
}

/// Renders a playbook into an injection template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookRenderer {
    template: String,
}

impl PlaybookRenderer {
    /// Creates a renderer with [`DEFAULT_TEMPLATE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Creates a renderer with a custom template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the template lacks `{key_points}`.
    pub fn with_template(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(KEY_POINTS_PLACEHOLDER) {
            return Err(Error::InvalidInput(format!(
                "template must contain the {KEY_POINTS_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self { template })
    }

    /// Loads a template from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or lacks `{key_points}`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_template".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::with_template(template)
    }

    /// Loads the template at `path` if given, falling back to the default
    /// (with a warning) when it is unusable.
    #[must_use]
    pub fn from_optional_file(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::new();
        };
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default playbook template");
            Self::new()
        })
    }

    /// Returns the template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders the playbook, or returns an empty string if it has no entries.
    #[must_use]
    pub fn render(&self, playbook: &Playbook) -> String {
        let key_points = format_key_points(playbook);
        if key_points.is_empty() {
            return String::new();
        }
        self.template.replace(KEY_POINTS_PLACEHOLDER, &key_points)
    }
}

impl Default for PlaybookRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlaybookEntry, Section};

    fn sample() -> Playbook {
        let mut playbook = Playbook::new();
        playbook.push(
            Section::Others,
            PlaybookEntry::new("oth-001", "Prefer small commits"),
        );
        playbook.push(
            Section::Patterns,
            PlaybookEntry::new("pat-001", "Run the linter").with_counters(5, 1),
        );
        playbook.push(
            Section::Patterns,
            PlaybookEntry::new("pat-002", "Read the error first"),
        );
        playbook
    }

    #[test]
    fn test_format_key_points_order_and_layout() {
        assert_eq!(
            format_key_points(&sample()),
            "## PATTERNS & APPROACHES\n\
             [pat-001] helpful=5 harmful=1 :: Run the linter\n\
             [pat-002] helpful=0 harmful=0 :: Read the error first\n\
             \n\
             ## OTHERS\n\
             [oth-001] helpful=0 harmful=0 :: Prefer small commits"
        );
    }

    #[test]
    fn test_empty_playbook_renders_nothing() {
        assert_eq!(format_key_points(&Playbook::new()), "");
        assert_eq!(PlaybookRenderer::new().render(&Playbook::new()), "");
    }

    #[test]
    fn test_custom_template() {
        let renderer = PlaybookRenderer::with_template("HEADER\n{key_points}\nFOOTER").unwrap();
        let rendered = renderer.render(&sample());
        assert!(rendered.starts_with("HEADER\n## PATTERNS & APPROACHES\n"));
        assert!(rendered.ends_with("Prefer small commits\nFOOTER"));
    }

    #[test]
    fn test_default_template_asks_for_citations() {
        let rendered = PlaybookRenderer::default().render(&sample());
        assert!(rendered.contains("[pat-001]"));
        assert!(!rendered.contains(KEY_POINTS_PLACEHOLDER));
        assert!(DEFAULT_TEMPLATE.contains(KEY_POINTS_PLACEHOLDER));
    }

    #[test]
    fn test_default_template_explains_ratings() {
        assert!(DEFAULT_TEMPLATE.contains("helpful/harmful ratio"));
        assert!(DEFAULT_TEMPLATE.contains("harmful count"));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        assert!(matches!(
            PlaybookRenderer::with_template("no placeholder"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unusable_template_file_falls_back() {
        let renderer =
            PlaybookRenderer::from_optional_file(Some(Path::new("/nonexistent/template.md")));
        assert_eq!(renderer, PlaybookRenderer::new());
    }
}
