//! Claude Code hooks.
//!
//! Implements handlers for Claude Code hook events. Handlers read the hook
//! JSON from stdin and answer with JSON on stdout.
//!
//! # Hook Response JSON Format
//!
//! Context is injected via `hookSpecificOutput.additionalContext`:
//!
//! | Event | `hookEventName` | `additionalContext` Content |
//! |-------|-----------------|----------------------------|
//! | User prompt | `UserPromptSubmit` | Rendered playbook, first prompt of a session only |
//!
//! ```json
//! {
//!   "hookSpecificOutput": {
//!     "hookEventName": "UserPromptSubmit",
//!     "additionalContext": "# Playbook\n\n..."
//!   }
//! }
//! ```
//!
//! ## Empty Response
//!
//! When there is nothing to inject, handlers return an empty object `{}`.

mod user_prompt;

pub use user_prompt::UserPromptHandler;

use crate::Result;

/// Response meaning "nothing to add".
pub const EMPTY_RESPONSE: &str = "{}";

/// Trait for hook handlers.
pub trait HookHandler: Send + Sync {
    /// The hook event type this handler processes.
    fn event_type(&self) -> &'static str;

    /// Handles the hook event.
    ///
    /// # Errors
    ///
    /// Returns an error if handling fails.
    fn handle(&self, input: &str) -> Result<String>;
}
