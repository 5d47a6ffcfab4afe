//! Extraction results handed over by the reflection/curation collaborator.

use super::Operation;
use crate::{Error, Result};
use serde_json::Value;

/// Verdict attached to an entry by an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rating {
    /// Entry helped; increments `helpful`.
    Helpful,
    /// Entry hurt; increments `harmful`.
    Harmful,
    /// Entry was irrelevant.
    Neutral,
    /// Any other label. Ignored.
    Other(String),
}

impl Rating {
    /// Parses a rating label. Only the exact lowercase labels are recognised.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "helpful" => Self::Helpful,
            "harmful" => Self::Harmful,
            "neutral" => Self::Neutral,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A rating of one existing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Name of the rated entry.
    pub name: String,
    /// The verdict.
    pub rating: Rating,
}

impl Evaluation {
    /// Creates an evaluation.
    #[must_use]
    pub fn new(name: impl Into<String>, rating: Rating) -> Self {
        Self {
            name: name.into(),
            rating,
        }
    }

    /// Parses `{name, rating}`, also accepting the reflector's `{name, tag}`.
    ///
    /// Returns `None` when the name or label is missing.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let name = obj.get("name")?.as_str()?;
        let label = obj
            .get("rating")
            .or_else(|| obj.get("tag"))
            .and_then(Value::as_str)?;
        Some(Self::new(name, Rating::parse(label)))
    }
}

/// A key point proposed through the legacy (pre-operations) path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKeyPoint {
    /// Proposed text.
    pub text: String,
    /// Raw target section name.
    pub section: Option<String>,
}

impl NewKeyPoint {
    /// Parses a bare string or a `{text, section}` object.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self {
                text: text.clone(),
                section: None,
            }),
            Value::Object(obj) => Some(Self {
                text: obj.get("text")?.as_str()?.to_string(),
                section: obj
                    .get("section")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// What the upstream LLM produced for one session.
///
/// `operations` is `Some` whenever the result carried an `operations` list,
/// even an empty one; that suppresses the legacy `new_key_points` path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Curator operations, if the new format was used.
    pub operations: Option<Vec<Operation>>,
    /// Legacy key point proposals.
    pub new_key_points: Vec<NewKeyPoint>,
    /// Ratings of existing entries.
    pub evaluations: Vec<Evaluation>,
}

impl ExtractionResult {
    /// Builds a result from parsed JSON. Malformed parts are dropped.
    ///
    /// An `operations` value that is not a list counts as absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let operations = value.get("operations").and_then(Operation::list_from_value);

        let new_key_points = value
            .get("new_key_points")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(NewKeyPoint::from_value).collect())
            .unwrap_or_default();

        let evaluations = value
            .get("evaluations")
            .or_else(|| value.get("bullet_tags"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Evaluation::from_value).collect())
            .unwrap_or_default();

        Self {
            operations,
            new_key_points,
            evaluations,
        }
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the text is not JSON.
    pub fn from_json(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| Error::InvalidInput(format!("extraction result is not JSON: {e}")))?;
        Ok(Self::from_value(&value))
    }

    /// Returns true when the operations path applies.
    #[must_use]
    pub const fn uses_operations(&self) -> bool {
        self.operations.is_some()
    }
}
