//! Curator operations.
//!
//! Operations arrive as loosely shaped JSON from an LLM collaborator. Parsing
//! never fails: fields of the wrong type read as empty, and anything without a
//! recognised `type` becomes [`Operation::Unknown`]. Validation of the field
//! contents is left to the curator engine.

use serde_json::Value;

/// A single curator instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Add a new entry.
    Add {
        /// Entry text.
        text: String,
        /// Raw target section name.
        section: Option<String>,
    },
    /// Replace several entries with one combined entry.
    Merge {
        /// Names of the entries to combine.
        source_ids: Vec<String>,
        /// Text of the combined entry.
        merged_text: String,
        /// Raw target section name.
        section: Option<String>,
    },
    /// Replace an entry's text.
    Update {
        /// Name of the entry to change.
        target_id: String,
        /// New text.
        text: String,
    },
    /// Remove an entry.
    Delete {
        /// Name of the entry to remove.
        target_id: String,
        /// Audit note; never persisted.
        reason: Option<String>,
    },
    /// An instruction with a missing or unsupported type.
    Unknown {
        /// The type string as received (empty if absent).
        kind: String,
    },
}

impl Operation {
    /// Parses one operation from JSON.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::Unknown {
                kind: String::new(),
            };
        };

        let kind = obj.get("type").and_then(Value::as_str).unwrap_or_default();
        let text_field = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let optional_field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        // Type labels match exactly, like evaluation ratings.
        match kind {
            "ADD" => Self::Add {
                text: text_field("text"),
                section: optional_field("section"),
            },
            "MERGE" => Self::Merge {
                source_ids: obj
                    .get("source_ids")
                    .and_then(Value::as_array)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
                merged_text: text_field("merged_text"),
                section: optional_field("section"),
            },
            "UPDATE" => Self::Update {
                target_id: text_field("target_id"),
                text: text_field("text"),
            },
            "DELETE" => Self::Delete {
                target_id: text_field("target_id"),
                reason: optional_field("reason"),
            },
            _ => Self::Unknown {
                kind: kind.to_string(),
            },
        }
    }

    /// Parses a JSON list of operations. Non-list input yields `None`.
    #[must_use]
    pub fn list_from_value(value: &Value) -> Option<Vec<Self>> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_value).collect())
    }

    /// Short upper-case label used in logs and reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "ADD",
            Self::Merge { .. } => "MERGE",
            Self::Update { .. } => "UPDATE",
            Self::Delete { .. } => "DELETE",
            Self::Unknown { .. } => "UNKNOWN",
        }
    }
}
