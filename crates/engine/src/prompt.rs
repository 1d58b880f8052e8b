//! Prompt assembly.
//!
//! A prompt is always three messages: the system role, the standing
//! instruction, and the per-invocation context.

use crate::context::AggregatedContext;
use crate::invocation::InvocationContext;
use crate::sanitize::sanitize;
use autoline_core::message::Message;

pub const SYSTEM_PROMPT: &str = "You are an AI autocompleting for user's terminal session.";

pub const INSTRUCTION_PROMPT: &str = "I will give you information from user's terminal - screen content and history of related commands ran. You can use this information to complete the current command line.

You have to reply with only the full command lines, do not output anything else. Do not prepend the lines with line numbers. Reply with 1-5 completions. The returned lines should contain the user command line input, and you can also change the user input if needed.";

#[derive(Debug, Default, Clone, Copy)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the message list. `terminal` is the raw capture; it is
    /// sanitized here and omitted when empty.
    pub fn build(
        &self,
        ctx: &InvocationContext,
        context: &AggregatedContext,
        terminal: Option<&str>,
    ) -> Vec<Message> {
        vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(INSTRUCTION_PROMPT),
            Message::user(self.context_text(ctx, context, terminal)),
        ]
    }

    /// The third message on its own.
    pub fn context_text(
        &self,
        ctx: &InvocationContext,
        context: &AggregatedContext,
        terminal: Option<&str>,
    ) -> String {
        let terminal = terminal.map(sanitize).unwrap_or_default();
        let terminal_section = if terminal.is_empty() {
            String::new()
        } else {
            format!("Terminal content:\n{terminal}\n\n")
        };

        format!(
            "User terminal information:\nShell: {shell}\n{terminal_section}{blocks}\nCWD: {cwd}\nCurrent command line: {cmdline}",
            shell = ctx.shell,
            blocks = context.render(),
            cwd = ctx.cwd,
            cmdline = ctx.command_line,
        )
    }
}
