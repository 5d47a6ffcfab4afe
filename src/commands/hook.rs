//! Hook command handler.

use agentic_context::config::AgenticContextConfig;
use agentic_context::hooks::{EMPTY_RESPONSE, HookHandler, UserPromptHandler};
use std::io::{self, Read};
use tracing::info_span;

use super::HookEvent;

/// Hook command.
///
/// Always prints a JSON response, `{}` when the hook fails.
pub fn cmd_hook(
    event: HookEvent,
    config: &AgenticContextConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let span = info_span!(
        "agentic_context.hook.invoke",
        component = "hooks",
        hook = event.as_str()
    );
    let _span_guard = span.enter();

    let result = respond(&event, config, io::stdin().lock());

    // Output response (already JSON string)
    println!("{}", response_or_empty(&result));

    result.map(|_| ())
}

/// Runs the handler for `event` on input read from `reader`.
fn respond(
    event: &HookEvent,
    config: &AgenticContextConfig,
    reader: impl Read,
) -> Result<String, Box<dyn std::error::Error>> {
    let input = read_hook_input(reader)?;
    let response = match event {
        HookEvent::UserPromptSubmit => UserPromptHandler::from_config(config).handle(&input)?,
    };
    Ok(response)
}

fn response_or_empty(result: &Result<String, Box<dyn std::error::Error>>) -> &str {
    result.as_deref().unwrap_or(EMPTY_RESPONSE)
}

/// Reads hook input as a string.
fn read_hook_input(mut reader: impl Read) -> Result<String, Box<dyn std::error::Error>> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    if input.trim().is_empty() {
        Ok("{}".to_string())
    } else {
        Ok(input)
    }
}
