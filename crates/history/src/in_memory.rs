//! In-memory history, useful for testing and for callers that already hold
//! the entries.

use async_trait::async_trait;
use autoline_core::error::HistoryError;
use autoline_core::history::{HistoryEntry, HistoryQuery, HistorySource};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A history source that keeps entries in a Vec.
pub struct InMemoryHistory {
    entries: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    pub async fn push(&self, entry: HistoryEntry) {
        self.entries.write().await.push(entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistorySource for InMemoryHistory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn query(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>, HistoryError> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().await;
        let mut matching: Vec<&HistoryEntry> =
            entries.iter().filter(|e| query.filter.matches(e)).collect();
        // Stable sort: equal timestamps keep insertion order.
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut seen = HashSet::new();
        let results = matching
            .into_iter()
            .filter(|e| !query.filter.is_distinct() || seen.insert(e.command.as_str()))
            .take(query.limit)
            .cloned()
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoline_core::history::HistoryFilter;

    fn entry(command: &str, cwd: &str, session: &str, timestamp: i64) -> HistoryEntry {
        HistoryEntry {
            command: command.into(),
            cwd: cwd.into(),
            session: session.into(),
            timestamp,
        }
    }

    fn sample() -> InMemoryHistory {
        InMemoryHistory::from_entries(vec![
            entry("git add .", "/repo", "s1", 10),
            entry("ls", "/repo", "s2", 20),
            entry("git log", "/tmp", "s1", 30),
            entry("git status", "/repo", "s2", 40),
            entry("git log", "/repo", "s2", 50),
        ])
    }

    #[tokio::test]
    async fn process_query_is_distinct_and_most_recent_first() {
        let history = sample();
        let rows = history
            .query(&HistoryQuery::new(
                HistoryFilter::Process {
                    prefix: "git".into(),
                },
                10,
            ))
            .await
            .unwrap();
        let commands: Vec<&str> = rows.iter().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, vec!["git log", "git status", "git add ."]);
        assert_eq!(rows[0].timestamp, 50);
    }

    #[tokio::test]
    async fn cwd_query_keeps_duplicates() {
        let history = sample();
        history.push(entry("ls", "/repo", "s3", 60)).await;
        let rows = history
            .query(&HistoryQuery::new(
                HistoryFilter::Cwd {
                    cwd: "/repo".into(),
                },
                10,
            ))
            .await
            .unwrap();
        let commands: Vec<&str> = rows.iter().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, vec!["ls", "git log", "git status", "ls", "git add ."]);
    }

    #[tokio::test]
    async fn session_query_respects_limit() {
        let history = sample();
        let rows = history
            .query(&HistoryQuery::new(
                HistoryFilter::Session {
                    session: "s2".into(),
                },
                2,
            ))
            .await
            .unwrap();
        let commands: Vec<&str> = rows.iter().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, vec!["git log", "git status"]);
    }

    #[tokio::test]
    async fn zero_limit_returns_nothing() {
        let history = sample();
        let rows = history
            .query(&HistoryQuery::new(
                HistoryFilter::Cwd {
                    cwd: "/repo".into(),
                },
                0,
            ))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn len_and_name() {
        let history = InMemoryHistory::new();
        assert!(history.is_empty().await);
        history.push(entry("pwd", "/", "s", 1)).await;
        assert_eq!(history.len().await, 1);
        assert_eq!(history.name(), "in_memory");
    }
}
