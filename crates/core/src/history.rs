//! History trait: the read-only log of past command invocations.
//!
//! Backed in production by the Atuin history database. The engine issues
//! four kinds of queries (by executable prefix, by working directory, by
//! session, by both directory and prefix), each bounded by a row limit and
//! answered most-recent-first.

use crate::error::HistoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The full command line as typed
    pub command: String,

    /// Working directory the command ran in
    pub cwd: String,

    /// Shell session identifier
    pub session: String,

    /// When the command ran (nanoseconds since the Unix epoch)
    pub timestamp: i64,
}

/// Which slice of history to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryFilter {
    /// Distinct commands starting with `prefix`; one row per command text,
    /// positioned by its most recent use.
    Process { prefix: String },
    /// Entries recorded in `cwd`.
    Cwd { cwd: String },
    /// Entries recorded in `session`.
    Session { session: String },
    /// Entries recorded in `cwd` whose command starts with `prefix`.
    CwdProcess { cwd: String, prefix: String },
}

impl HistoryFilter {
    /// Whether an entry passes the filter (ignores deduplication).
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        match self {
            HistoryFilter::Process { prefix } => entry.command.starts_with(prefix.as_str()),
            HistoryFilter::Cwd { cwd } => entry.cwd == *cwd,
            HistoryFilter::Session { session } => entry.session == *session,
            HistoryFilter::CwdProcess { cwd, prefix } => {
                entry.cwd == *cwd && entry.command.starts_with(prefix.as_str())
            }
        }
    }

    /// Whether results are deduplicated by command text.
    pub fn is_distinct(&self) -> bool {
        matches!(self, HistoryFilter::Process { .. })
    }
}

/// A bounded history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub filter: HistoryFilter,

    /// Maximum number of rows
    pub limit: usize,
}

impl HistoryQuery {
    pub fn new(filter: HistoryFilter, limit: usize) -> Self {
        Self { filter, limit }
    }
}

/// A queryable history log.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Backend name (e.g., "atuin", "in_memory").
    fn name(&self) -> &str;

    /// Run a query; rows come back ordered by descending timestamp.
    async fn query(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>, HistoryError>;
}
