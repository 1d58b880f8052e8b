//! Terminal screen capture through the WezTerm CLI.

use async_trait::async_trait;
use autoline_core::capture::TerminalCapture;
use autoline_core::error::CaptureError;
use tokio::process::Command;
use tracing::debug;

pub struct WeztermCapture {
    program: String,
}

impl WeztermCapture {
    pub fn new() -> Self {
        Self::with_program("wezterm")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for WeztermCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TerminalCapture for WeztermCapture {
    fn name(&self) -> &str {
        "wezterm"
    }

    async fn capture(&self) -> Result<String, CaptureError> {
        let output = Command::new(&self.program)
            .args(["cli", "get-text"])
            .output()
            .await
            .map_err(|e| CaptureError::Launch {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(CaptureError::ExitStatus {
                program: self.program.clone(),
                code: output.status.code().unwrap_or(-1),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(bytes = text.len(), "Captured terminal text");
        Ok(text)
    }
}
