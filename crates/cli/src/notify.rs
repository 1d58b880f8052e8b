//! Desktop notifications through `dunstify`.

use async_trait::async_trait;
use autoline_core::notify::{Notice, NotificationSink};
use tokio::process::Command;
use tracing::{debug, warn};

const MIN_REPLACE_ID: u32 = 2183;
const MAX_REPLACE_ID: u32 = 1_000_000;

/// Sends every notice of one run under the same replace id, so each new
/// notice overwrites the previous one on screen.
pub struct DunstNotifier {
    program: String,
    replace_id: u32,
}

impl DunstNotifier {
    pub fn new() -> Self {
        Self::with_program("dunstify")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        let spread = std::process::id() % (MAX_REPLACE_ID - MIN_REPLACE_ID);
        Self {
            program: program.into(),
            replace_id: MIN_REPLACE_ID + spread,
        }
    }

    pub fn replace_id(&self) -> u32 {
        self.replace_id
    }

    fn args(&self, notice: &Notice, body: &str) -> Vec<String> {
        vec![
            "-r".into(),
            self.replace_id.to_string(),
            notice.summary(),
            body.to_string(),
        ]
    }
}

impl Default for DunstNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for DunstNotifier {
    async fn notify(&self, notice: &Notice, body: &str) {
        if let Notice::Failed { reason } = notice {
            debug!(reason = %reason, "Sending failure notice");
        }

        match Command::new(&self.program)
            .args(self.args(notice, body))
            .status()
            .await
        {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(program = %self.program, %status, "Notification command failed"),
            Err(e) => warn!(program = %self.program, error = %e, "Could not run notification command"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_id_is_in_range() {
        let notifier = DunstNotifier::new();
        assert!(notifier.replace_id() >= MIN_REPLACE_ID);
        assert!(notifier.replace_id() < MAX_REPLACE_ID);
    }

    #[test]
    fn replace_id_is_stable_per_process() {
        assert_eq!(DunstNotifier::new().replace_id(), DunstNotifier::new().replace_id());
    }

    #[test]
    fn command_arguments() {
        let notifier = DunstNotifier::new();
        let args = notifier.args(&Notice::Queued { tokens: 812 }, "/repo\n\ngit st");
        assert_eq!(
            args,
            vec![
                "-r".to_string(),
                notifier.replace_id().to_string(),
                "Completing, 812 tokens".into(),
                "/repo\n\ngit st".into(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_program_is_not_fatal() {
        let notifier = DunstNotifier::with_program("autoline-no-such-notifier");
        notifier.notify(&Notice::Completed, "git st").await;
    }
}
