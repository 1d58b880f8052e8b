//! Per-line cleanup of model output.
//!
//! Models tend to decorate completions with list numbering or inline-code
//! backticks even when told not to. Each [`LineRule`] strips one kind of
//! decoration; [`LineCleanup`] applies them in order.

use regex::Regex;
use std::sync::{Arc, LazyLock};

static ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+").expect("enumeration pattern is valid"));

/// One cleanup step on a single output line.
pub trait LineRule: Send + Sync {
    fn apply(&self, line: &str) -> String;
}

/// Strips a leading `N. ` list marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumerationMarker;

impl LineRule for EnumerationMarker {
    fn apply(&self, line: &str) -> String {
        ENUMERATION.replace(line, "").into_owned()
    }
}

/// Strips a character from both ends of the line.
#[derive(Debug, Clone, Copy)]
pub struct TrimChars(pub char);

impl LineRule for TrimChars {
    fn apply(&self, line: &str) -> String {
        line.trim_matches(self.0).to_string()
    }
}

/// An ordered list of rules. Clones share the rules.
#[derive(Clone)]
pub struct LineCleanup {
    rules: Vec<Arc<dyn LineRule>>,
}

impl LineCleanup {
    pub fn new(rules: Vec<Arc<dyn LineRule>>) -> Self {
        Self { rules }
    }

    /// No rules; lines pass through unchanged.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_rule(mut self, rule: impl LineRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn apply(&self, line: &str) -> String {
        self.rules
            .iter()
            .fold(line.to_string(), |acc, rule| rule.apply(&acc))
    }
}

impl Default for LineCleanup {
    /// Enumeration markers, then backticks.
    fn default() -> Self {
        Self::none()
            .with_rule(EnumerationMarker)
            .with_rule(TrimChars('`'))
    }
}

impl std::fmt::Debug for LineCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineCleanup")
            .field("rules", &self.rules.len())
            .finish()
    }
}
