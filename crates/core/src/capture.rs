//! Terminal capture: the visible text of the user's terminal, on demand.

use crate::error::CaptureError;
use async_trait::async_trait;

#[async_trait]
pub trait TerminalCapture: Send + Sync {
    /// Terminal name (e.g., "wezterm").
    fn name(&self) -> &str;

    /// Raw screen contents, escape sequences and all.
    async fn capture(&self) -> Result<String, CaptureError>;
}
