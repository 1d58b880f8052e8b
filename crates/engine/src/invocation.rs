//! Everything one run needs to know about its caller, built once and passed
//! down explicitly.

use crate::budget::DEFAULT_TOKEN_CEILING;
use crate::context::HistoryLimits;
use autoline_core::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Atuin session of the invoking shell
    pub session_id: String,
    /// Working directory of the invoking shell
    pub cwd: String,
    /// The partially typed command line
    pub command_line: String,
    /// Shell name, shown to the model
    pub shell: String,
    /// Completion model
    pub model: String,
    pub limits: HistoryLimits,
    pub token_ceiling: usize,
}

impl InvocationContext {
    /// Build a context with default model, shell, limits and ceiling.
    ///
    /// A missing or blank session id is a configuration error: history
    /// scoping depends on it.
    pub fn new(
        session_id: Option<String>,
        cwd: impl Into<String>,
        command_line: impl Into<String>,
    ) -> Result<Self> {
        let session_id = session_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::config("ATUIN_SESSION is not set"))?;

        Ok(Self {
            session_id,
            cwd: cwd.into(),
            command_line: command_line.into(),
            shell: "nushell".into(),
            model: "gpt-3.5-turbo".into(),
            limits: HistoryLimits::default(),
            token_ceiling: DEFAULT_TOKEN_CEILING,
        })
    }

    /// First whitespace-delimited word of the command line, if any.
    pub fn target_executable(&self) -> Option<&str> {
        self.command_line.split_whitespace().next()
    }

    /// Body text for notifications.
    pub fn notice_body(&self) -> String {
        format!("{}\n\n{}", self.cwd, self.command_line)
    }
}
