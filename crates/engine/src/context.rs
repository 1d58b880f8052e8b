//! History context aggregation.
//!
//! Pulls four independent, bounded slices from the history source and
//! renders each as a labeled block:
//!
//! | Block | Filter | Default rows |
//! |-------|--------|--------------|
//! | Process | command starts with the target executable, distinct | 10 |
//! | Cwd | same working directory | 10 |
//! | Session | same shell session | 10 |
//! | Cwd + process | both of the above | 5 |
//!
//! A limit of 0 disables a block without querying the source. Any source
//! failure aborts the whole collection.

use crate::invocation::InvocationContext;
use autoline_core::error::Result;
use autoline_core::history::{HistoryFilter, HistoryQuery, HistorySource};
use std::sync::Arc;
use tracing::debug;

pub const PROCESS_LABEL: &str = "Latest calls for the same executable:";
pub const CWD_LABEL: &str = "Latest calls in the same directory:";
pub const SESSION_LABEL: &str = "Latest calls in the same session:";
pub const CWD_PROCESS_LABEL: &str = "Latest calls in the same directory for the same process:";

/// Row limits per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub process: usize,
    pub cwd: usize,
    pub session: usize,
    pub cwd_process: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            process: 10,
            cwd: 10,
            session: 10,
            cwd_process: 5,
        }
    }
}

/// A labeled slice of history, one command per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlock {
    pub label: String,
    pub lines: Vec<String>,
}

impl ContextBlock {
    pub fn new(label: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            label: label.into(),
            lines,
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(label, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `label\nline\n...\n\n`, or `""` when there are no lines.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        format!("{}\n{}\n\n", self.label, self.lines.join("\n"))
    }
}

/// The four blocks of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedContext {
    pub process: ContextBlock,
    pub cwd: ContextBlock,
    pub session: ContextBlock,
    pub cwd_process: ContextBlock,
}

impl AggregatedContext {
    /// Blocks in prompt order: session, cwd, process, cwd + process.
    pub fn blocks(&self) -> [&ContextBlock; 4] {
        [&self.session, &self.cwd, &self.process, &self.cwd_process]
    }

    pub fn render(&self) -> String {
        self.blocks().iter().map(|b| b.render()).collect()
    }
}

pub struct ContextAggregator {
    source: Arc<dyn HistorySource>,
    limits: HistoryLimits,
}

impl ContextAggregator {
    pub fn new(source: Arc<dyn HistorySource>, limits: HistoryLimits) -> Self {
        Self { source, limits }
    }

    pub async fn collect(&self, ctx: &InvocationContext) -> Result<AggregatedContext> {
        // Without an executable there is nothing to prefix-match on. An empty
        // prefix would match every command, so both prefix blocks stay empty.
        let prefix = ctx.target_executable();

        let process = match prefix {
            Some(prefix) => {
                self.block(
                    PROCESS_LABEL,
                    HistoryFilter::Process {
                        prefix: prefix.to_string(),
                    },
                    self.limits.process,
                )
                .await?
            }
            None => ContextBlock::empty(PROCESS_LABEL),
        };

        let cwd = self
            .block(
                CWD_LABEL,
                HistoryFilter::Cwd {
                    cwd: ctx.cwd.clone(),
                },
                self.limits.cwd,
            )
            .await?;

        let session = self
            .block(
                SESSION_LABEL,
                HistoryFilter::Session {
                    session: ctx.session_id.clone(),
                },
                self.limits.session,
            )
            .await?;

        let cwd_process = match prefix {
            Some(prefix) => {
                self.block(
                    CWD_PROCESS_LABEL,
                    HistoryFilter::CwdProcess {
                        cwd: ctx.cwd.clone(),
                        prefix: prefix.to_string(),
                    },
                    self.limits.cwd_process,
                )
                .await?
            }
            None => ContextBlock::empty(CWD_PROCESS_LABEL),
        };

        Ok(AggregatedContext {
            process,
            cwd,
            session,
            cwd_process,
        })
    }

    async fn block(&self, label: &str, filter: HistoryFilter, limit: usize) -> Result<ContextBlock> {
        if limit == 0 {
            return Ok(ContextBlock::empty(label));
        }

        let entries = self
            .source
            .query(&HistoryQuery::new(filter, limit))
            .await?;
        debug!(source = self.source.name(), label, rows = entries.len(), "Collected history block");

        Ok(ContextBlock::new(
            label,
            entries.into_iter().map(|e| e.command).collect(),
        ))
    }
}
