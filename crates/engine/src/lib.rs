//! # autoline Engine
//!
//! Turns an invocation (command line, cwd, session) into streamed completion
//! candidates:
//!
//! | Stage | Module |
//! |-------|--------|
//! | History slices → labeled blocks | [`context`] |
//! | Terminal text cleanup | [`sanitize`] |
//! | Blocks → ordered messages | [`prompt`] |
//! | Messages → token cost | [`token`] |
//! | Cost vs. ceiling | [`budget`] |
//! | Fragments → cleaned lines | [`reassembler`], [`cleanup`] |
//! | All of the above, plus notifications | [`session`] |

pub mod budget;
pub mod cleanup;
pub mod context;
pub mod invocation;
pub mod prompt;
pub mod reassembler;
pub mod sanitize;
pub mod session;
pub mod token;

pub use budget::{BudgetGate, DEFAULT_TOKEN_CEILING, Verdict};
pub use cleanup::{LineCleanup, LineRule};
pub use context::{AggregatedContext, ContextAggregator, ContextBlock, HistoryLimits};
pub use invocation::InvocationContext;
pub use prompt::PromptBuilder;
pub use reassembler::{Reassembler, candidate_stream};
pub use sanitize::sanitize;
pub use session::{CompletionSession, Outcome, PreparedPrompt};
pub use token::{ModelFamily, TokenEstimator, estimate};
