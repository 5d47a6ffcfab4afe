//! Command handlers module.
//!
//! - `playbook.rs`: Playbook commands (show, apply, prune, dedup, migrate)
//! - `hook.rs`: Claude Code hook event handlers

mod hook;
mod playbook;

use clap::Subcommand;

pub use hook::cmd_hook;
pub use playbook::{cmd_apply, cmd_dedup, cmd_migrate, cmd_prune, cmd_show};

/// Hook events.
#[derive(Subcommand)]
pub enum HookEvent {
    /// User prompt submit hook.
    UserPromptSubmit,
}

impl HookEvent {
    /// Returns the hook event as a lowercase hyphenated string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UserPromptSubmit => "user-prompt-submit",
        }
    }
}
