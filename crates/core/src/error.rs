//! Error types for the autoline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; all of them fold into
//! the top-level [`Error`].

use thiserror::Error;

/// The top-level error type for all autoline operations.
///
/// A budget rejection is deliberately absent: an oversized prompt is an
/// expected outcome of a run, not a failure.
#[derive(Debug, Error)]
pub enum Error {
    // --- Invocation context ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- History source ---
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    // --- Completion service ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Terminal capture ---
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    // --- Local output ---
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(", retry after {secs}s"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History source unavailable: {0}")]
    Unavailable(String),

    #[error("History query failed: {0}")]
    QueryFailed(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("{program} exited with status {code}")]
    ExitStatus { program: String, code: i32 },
}
