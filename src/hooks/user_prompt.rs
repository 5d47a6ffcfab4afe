//! User prompt submit hook handler.

use super::HookHandler;
use crate::config::AgenticContextConfig;
use crate::observability::DiagnosticWriter;
use crate::rendering::PlaybookRenderer;
use crate::storage::PlaybookStore;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Session id assumed when the hook input carries none.
const UNKNOWN_SESSION: &str = "unknown";

/// Injects the rendered playbook on the first prompt of each session.
///
/// A prompt is the first of its session when its `session_id` differs from
/// the one recorded in `last_session.txt`. The id is recorded only after a
/// playbook was actually injected.
///
/// # Response
///
/// ```json
/// {
///   "hookSpecificOutput": {
///     "hookEventName": "UserPromptSubmit",
///     "additionalContext": "# Playbook\n\n..."
///   }
/// }
/// ```
///
/// Returns `{}` for later prompts, an empty playbook, or malformed input.
pub struct UserPromptHandler {
    store: PlaybookStore,
    session_marker: PathBuf,
    renderer: PlaybookRenderer,
    diagnostics: Option<DiagnosticWriter>,
}

impl UserPromptHandler {
    /// Creates a handler with the default template.
    #[must_use]
    pub fn new(store: PlaybookStore, session_marker: impl Into<PathBuf>) -> Self {
        Self {
            store,
            session_marker: session_marker.into(),
            renderer: PlaybookRenderer::new(),
            diagnostics: None,
        }
    }

    /// Builds a handler for the configured project.
    #[must_use]
    pub fn from_config(config: &AgenticContextConfig) -> Self {
        let handler = Self::new(
            PlaybookStore::new(config.playbook_path()),
            config.session_marker_path(),
        )
        .with_renderer(PlaybookRenderer::from_optional_file(
            config.template_path.as_deref(),
        ));
        match config.diagnostics() {
            Some(writer) => handler.with_diagnostics(writer),
            None => handler,
        }
    }

    /// Sets the renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: PlaybookRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Enables diagnostic reports.
    #[must_use]
    pub fn with_diagnostics(mut self, writer: DiagnosticWriter) -> Self {
        self.diagnostics = Some(writer);
        self
    }

    /// Returns the session marker path.
    #[must_use]
    pub fn session_marker(&self) -> &Path {
        &self.session_marker
    }

    fn is_first_message(&self, session_id: &str) -> bool {
        std::fs::read_to_string(&self.session_marker)
            .map_or(true, |last| last.trim() != session_id)
    }

    fn mark_session(&self, session_id: &str) -> Result<()> {
        if let Some(parent) = self.session_marker.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_session_dir".to_string(),
                cause: e.to_string(),
            })?;
        }
        std::fs::write(&self.session_marker, session_id).map_err(|e| Error::OperationFailed {
            operation: "mark_session".to_string(),
            cause: format!("{}: {e}", self.session_marker.display()),
        })
    }
}

impl HookHandler for UserPromptHandler {
    fn event_type(&self) -> &'static str {
        "UserPromptSubmit"
    }

    #[instrument(skip(self, input), fields(hook = "UserPromptSubmit"))]
    fn handle(&self, input: &str) -> Result<String> {
        let input_json: serde_json::Value = match serde_json::from_str(input) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            Ok(_) | Err(_) => {
                tracing::warn!("Malformed hook input, skipping playbook injection");
                return Ok(super::EMPTY_RESPONSE.to_string());
            },
        };

        let session_id = input_json
            .get("session_id")
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_SESSION);

        if !self.is_first_message(session_id) {
            tracing::debug!(session_id, "Not the first prompt of the session");
            return Ok(super::EMPTY_RESPONSE.to_string());
        }

        let playbook = self.store.load();
        let context = self.renderer.render(&playbook);
        if context.is_empty() {
            tracing::debug!("Playbook is empty, nothing to inject");
            return Ok(super::EMPTY_RESPONSE.to_string());
        }

        if let Some(writer) = &self.diagnostics {
            writer.write("user_prompt_inject", &context);
        }

        let response = serde_json::json!({
            "hookSpecificOutput": {
                "hookEventName": self.event_type(),
                "additionalContext": context
            }
        });
        let body = serde_json::to_string(&response).map_err(|e| Error::OperationFailed {
            operation: "serialize_response".to_string(),
            cause: e.to_string(),
        })?;

        if let Err(e) = self.mark_session(session_id) {
            tracing::warn!(error = %e, "Could not record session id");
        }
        tracing::info!(session_id, entries = playbook.len(), "Injected playbook");
        metrics::counter!("playbook_injections_total").increment(1);

        Ok(body)
    }
}
