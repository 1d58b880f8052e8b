//! Token estimation for chat prompts.
//!
//! Counts the way the OpenAI chat API bills a prompt: a fixed overhead per
//! message, the BPE tokens of every field (role, content, optional name), a
//! per-name adjustment, and three tokens priming the reply.
//!
//! The tokenizer is picked from the model name. Unknown models fall back to
//! `cl100k_base`; if even that cannot be loaded, a ~4 characters per token
//! heuristic keeps the estimate deterministic.

use autoline_core::message::Message;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Every reply is primed with `<|start|>assistant<|message|>`.
const REPLY_PRIMING_TOKENS: i64 = 3;

/// Per-message accounting of a model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelFamily {
    /// Added for every message
    pub tokens_per_message: i64,
    /// Added when a message carries a name
    pub tokens_per_name: i64,
}

impl ModelFamily {
    /// `gpt-3.5*`: `<|start|>{role/name}\n{content}<|end|>\n`; a name replaces
    /// the role. Everything else follows the gpt-4 layout.
    pub fn for_model(model: &str) -> Self {
        if model.contains("gpt-3.5") {
            Self {
                tokens_per_message: 4,
                tokens_per_name: -1,
            }
        } else {
            Self {
                tokens_per_message: 3,
                tokens_per_name: 1,
            }
        }
    }
}

/// A model-bound token counter. Build once per run; loading the BPE ranks is
/// not free.
pub struct TokenEstimator {
    family: ModelFamily,
    bpe: Option<CoreBPE>,
}

impl TokenEstimator {
    pub fn for_model(model: &str) -> Self {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Some(bpe),
            Err(_) => {
                debug!(model, "No tokenizer registered for model, using cl100k_base");
                match tiktoken_rs::cl100k_base() {
                    Ok(bpe) => Some(bpe),
                    Err(e) => {
                        warn!(error = %e, "cl100k_base unavailable, estimating by characters");
                        None
                    }
                }
            }
        };

        Self {
            family: ModelFamily::for_model(model),
            bpe,
        }
    }

    /// Tokens in a bare string.
    pub fn count_text(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => heuristic_tokens(text),
        }
    }

    /// Estimated prompt cost of `messages`, reply priming included.
    pub fn estimate(&self, messages: &[Message]) -> usize {
        let mut total = REPLY_PRIMING_TOKENS;

        for message in messages {
            total += self.family.tokens_per_message;
            total += self.count_text(message.role.as_str()) as i64;
            total += self.count_text(&message.content) as i64;
            if let Some(name) = &message.name {
                total += self.count_text(name) as i64;
                total += self.family.tokens_per_name;
            }
        }

        total.max(0) as usize
    }
}

/// Estimate `messages` for `model` with a throwaway estimator.
pub fn estimate(messages: &[Message], model: &str) -> usize {
    TokenEstimator::for_model(model).estimate(messages)
}

/// 1 token ≈ 4 characters, rounded up.
fn heuristic_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}
