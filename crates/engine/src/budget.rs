//! Token ceiling for outgoing prompts.

use crate::token::TokenEstimator;
use autoline_core::message::Message;

/// Prompts estimated above this many tokens are not sent.
pub const DEFAULT_TOKEN_CEILING: usize = 3500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass { tokens: usize },
    Reject { actual: usize, ceiling: usize },
}

impl Verdict {
    pub fn tokens(&self) -> usize {
        match self {
            Verdict::Pass { tokens } => *tokens,
            Verdict::Reject { actual, .. } => *actual,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BudgetGate {
    ceiling: usize,
}

impl BudgetGate {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// The ceiling itself is allowed.
    pub fn judge(&self, tokens: usize) -> Verdict {
        if tokens > self.ceiling {
            Verdict::Reject {
                actual: tokens,
                ceiling: self.ceiling,
            }
        } else {
            Verdict::Pass { tokens }
        }
    }

    pub fn check(&self, messages: &[Message], estimator: &TokenEstimator) -> Verdict {
        self.judge(estimator.estimate(messages))
    }
}

impl Default for BudgetGate {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_is_inclusive() {
        let gate = BudgetGate::default();
        assert_eq!(gate.judge(3500), Verdict::Pass { tokens: 3500 });
        assert_eq!(
            gate.judge(3501),
            Verdict::Reject {
                actual: 3501,
                ceiling: 3500
            }
        );
    }

    #[test]
    fn verdict_reports_tokens() {
        let gate = BudgetGate::new(10);
        assert_eq!(gate.judge(4).tokens(), 4);
        assert_eq!(gate.judge(40).tokens(), 40);
        assert!(gate.judge(10).is_pass());
        assert!(!gate.judge(11).is_pass());
    }

    #[test]
    fn check_uses_estimator() {
        let estimator = TokenEstimator::for_model("gpt-4");
        let messages = vec![Message::user("hello world")];
        let tokens = estimator.estimate(&messages);

        assert!(BudgetGate::new(tokens).check(&messages, &estimator).is_pass());
        assert_eq!(
            BudgetGate::new(tokens - 1).check(&messages, &estimator),
            Verdict::Reject {
                actual: tokens,
                ceiling: tokens - 1
            }
        );
    }
}
