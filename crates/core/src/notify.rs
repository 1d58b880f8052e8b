//! Notification sink for fire-and-forget status updates for the user.
//!
//! Each invocation owns one sink handle; consecutive notices replace each
//! other on screen instead of stacking.

use async_trait::async_trait;

/// A status update emitted while a completion runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The prompt passed the budget gate and is being sent.
    Queued { tokens: usize },
    /// The prompt was over budget; nothing was sent.
    Rejected { tokens: usize, ceiling: usize },
    /// The response stream finished.
    Completed,
    /// The run failed.
    Failed { reason: String },
}

impl Notice {
    /// One-line headline for the notification.
    pub fn summary(&self) -> String {
        match self {
            Notice::Queued { tokens } => format!("Completing, {tokens} tokens"),
            Notice::Rejected { tokens, ceiling } => {
                format!("Too many tokens, {tokens} > {ceiling}")
            }
            Notice::Completed => "Completion finished".into(),
            Notice::Failed { .. } => "Completion failed".into(),
        }
    }
}

/// Receives notices. Delivery failures are the sink's problem, never the
/// caller's.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Show `notice`; `body` carries the context line(s) (cwd, command line).
    async fn notify(&self, notice: &Notice, body: &str);
}

/// A sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl NotificationSink for NoopNotifier {
    async fn notify(&self, _notice: &Notice, _body: &str) {}
}
