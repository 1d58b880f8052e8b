//! One completion run, start to finish.

use crate::budget::{BudgetGate, Verdict};
use crate::cleanup::LineCleanup;
use crate::context::ContextAggregator;
use crate::invocation::InvocationContext;
use crate::prompt::PromptBuilder;
use crate::reassembler::candidate_stream;
use crate::token::TokenEstimator;
use autoline_core::error::Result;
use autoline_core::history::HistorySource;
use autoline_core::message::Message;
use autoline_core::notify::{Notice, NotificationSink};
use autoline_core::provider::{Provider, ProviderRequest};
use futures::StreamExt;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response stream completed.
    Completed { candidates: usize, tokens: usize },
    /// The prompt was over the ceiling and never sent.
    Rejected { tokens: usize, ceiling: usize },
}

/// A built prompt and its budget verdict.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub messages: Vec<Message>,
    pub verdict: Verdict,
}

pub struct CompletionSession {
    ctx: InvocationContext,
    history: Arc<dyn HistorySource>,
    provider: Arc<dyn Provider>,
    notifier: Arc<dyn NotificationSink>,
    estimator: TokenEstimator,
    cleanup: LineCleanup,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl CompletionSession {
    pub fn new(
        ctx: InvocationContext,
        history: Arc<dyn HistorySource>,
        provider: Arc<dyn Provider>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let estimator = TokenEstimator::for_model(&ctx.model);
        Self {
            ctx,
            history,
            provider,
            notifier,
            estimator,
            cleanup: LineCleanup::default(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sampling temperature sent with the request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap on generated tokens.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn context(&self) -> &InvocationContext {
        &self.ctx
    }

    /// Collect history, build the prompt and judge it against the ceiling.
    /// Nothing is sent.
    pub async fn prepare(&self, terminal: Option<&str>) -> Result<PreparedPrompt> {
        let aggregator = ContextAggregator::new(self.history.clone(), self.ctx.limits);
        let context = aggregator.collect(&self.ctx).await?;

        let messages = PromptBuilder::new().build(&self.ctx, &context, terminal);
        let verdict = BudgetGate::new(self.ctx.token_ceiling).check(&messages, &self.estimator);

        if let Some(prompt) = messages.last() {
            debug!(prompt = %prompt.content, "Prompt");
        }
        info!(tokens = verdict.tokens(), ceiling = self.ctx.token_ceiling, "Request tokens");

        Ok(PreparedPrompt { messages, verdict })
    }

    /// Run the whole pipeline, handing each candidate to `on_candidate` as
    /// soon as it is complete.
    ///
    /// Every failure is reported to the notification sink before it is
    /// returned. Candidates already delivered stay delivered.
    pub async fn run<F>(&self, terminal: Option<&str>, on_candidate: F) -> Result<Outcome>
    where
        F: FnMut(&str),
    {
        let result = self.run_inner(terminal, on_candidate).await;
        self.report(result).await
    }

    /// Send a failed `result` to the notification sink, then hand it back
    /// unchanged.
    pub async fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(error = %e, "Completion failed");
            self.notify(&Notice::Failed {
                reason: e.to_string(),
            })
            .await;
        }
        result
    }

    async fn run_inner<F>(&self, terminal: Option<&str>, mut on_candidate: F) -> Result<Outcome>
    where
        F: FnMut(&str),
    {
        let prepared = self.prepare(terminal).await?;

        let tokens = match prepared.verdict {
            Verdict::Reject { actual, ceiling } => {
                warn!(tokens = actual, ceiling, "Prompt over token ceiling, not sending");
                self.notify(&Notice::Rejected {
                    tokens: actual,
                    ceiling,
                })
                .await;
                return Ok(Outcome::Rejected {
                    tokens: actual,
                    ceiling,
                });
            }
            Verdict::Pass { tokens } => tokens,
        };

        self.notify(&Notice::Queued { tokens }).await;

        let mut request = ProviderRequest::new(self.ctx.model.clone(), prepared.messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let rx = self.provider.stream(request).await?;
        let candidates = candidate_stream(ReceiverStream::new(rx), self.cleanup.clone());
        futures::pin_mut!(candidates);

        let mut emitted = 0;
        while let Some(candidate) = candidates.next().await {
            let candidate = candidate?;
            debug!(candidate = %candidate, "Candidate");
            on_candidate(&candidate);
            emitted += 1;
        }

        info!(candidates = emitted, provider = self.provider.name(), "Completion finished");
        self.notify_with_body(&Notice::Completed, &self.ctx.command_line)
            .await;

        Ok(Outcome::Completed {
            candidates: emitted,
            tokens,
        })
    }

    async fn notify(&self, notice: &Notice) {
        self.notify_with_body(notice, &self.ctx.notice_body()).await;
    }

    async fn notify_with_body(&self, notice: &Notice, body: &str) {
        self.notifier.notify(notice, body).await;
    }
}
