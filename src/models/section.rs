//! Section registry.
//!
//! The playbook taxonomy is a closed set of five sections. Their order is the
//! iteration, formatting and persistence order everywhere in the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five canonical playbook sections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Section {
    /// Approaches that worked.
    #[serde(rename = "PATTERNS & APPROACHES")]
    Patterns,
    /// Mistakes the agent should not repeat.
    #[serde(rename = "MISTAKES TO AVOID")]
    Mistakes,
    /// Stated or observed user preferences.
    #[serde(rename = "USER PREFERENCES")]
    Preferences,
    /// Facts about the project at hand.
    #[serde(rename = "PROJECT CONTEXT")]
    ProjectContext,
    /// Everything else; the fallback for unknown section names.
    #[default]
    #[serde(rename = "OTHERS")]
    Others,
}

impl Section {
    /// Number of canonical sections.
    pub const COUNT: usize = 5;

    /// All sections in canonical order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Patterns,
        Self::Mistakes,
        Self::Preferences,
        Self::ProjectContext,
        Self::Others,
    ];

    /// Returns all sections in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &Self::ALL
    }

    /// Returns the canonical (persisted) section name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Patterns => "PATTERNS & APPROACHES",
            Self::Mistakes => "MISTAKES TO AVOID",
            Self::Preferences => "USER PREFERENCES",
            Self::ProjectContext => "PROJECT CONTEXT",
            Self::Others => "OTHERS",
        }
    }

    /// Returns the slug used as the entry id prefix.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Patterns => "pat",
            Self::Mistakes => "mis",
            Self::Preferences => "pref",
            Self::ProjectContext => "ctx",
            Self::Others => "oth",
        }
    }

    /// Position of this section in canonical order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parses a canonical section name, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything that is not one of the five names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|section| section.name().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a raw section name was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionResolution {
    /// The input named a canonical section.
    Matched(Section),
    /// The input was absent or blank; OTHERS is used silently.
    Defaulted,
    /// The input named no known section; OTHERS is used and the caller
    /// should report the fallback.
    FellBack(String),
}

impl SectionResolution {
    /// The section the input resolved to.
    #[must_use]
    pub const fn section(&self) -> Section {
        match self {
            Self::Matched(section) => *section,
            Self::Defaulted | Self::FellBack(_) => Section::Others,
        }
    }

    /// Returns true when an unrecognised name fell back to OTHERS.
    #[must_use]
    pub const fn fell_back(&self) -> bool {
        matches!(self, Self::FellBack(_))
    }
}

/// Resolves a raw section name supplied by an upstream collaborator.
///
/// Blank or missing input resolves to OTHERS without a diagnostic. Non-blank
/// input that matches no canonical name also resolves to OTHERS but is
/// reported as [`SectionResolution::FellBack`].
#[must_use]
pub fn resolve_section(raw: Option<&str>) -> SectionResolution {
    let Some(trimmed) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return SectionResolution::Defaulted;
    };

    Section::parse(trimmed).map_or_else(
        || SectionResolution::FellBack(trimmed.to_string()),
        SectionResolution::Matched,
    )
}

/// Resolves a raw section name and logs the OTHERS fallback.
#[must_use]
pub fn resolve_section_logged(raw: Option<&str>) -> Section {
    let resolution = resolve_section(raw);
    if let SectionResolution::FellBack(unknown) = &resolution {
        tracing::warn!(
            section = %unknown,
            fallback = Section::Others.name(),
            "Unknown section name, fell back to OTHERS"
        );
    }
    resolution.section()
}
