//! Atuin history backend.
//!
//! Reads the `history` table of Atuin's SQLite database:
//!
//! ```text
//! history(id, timestamp, duration, exit, command, cwd, session, hostname, deleted_at)
//! ```
//!
//! The database belongs to Atuin, so it is opened read-only and soft-deleted
//! rows (`deleted_at IS NOT NULL`) are ignored.

use async_trait::async_trait;
use autoline_core::error::HistoryError;
use autoline_core::history::{HistoryEntry, HistoryFilter, HistoryQuery, HistorySource};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

const PROCESS_SQL: &str = r#"
    SELECT command, cwd, session, MAX(timestamp) AS timestamp
    FROM history
    WHERE instr(command, ?) = 1 AND deleted_at IS NULL
    GROUP BY command
    ORDER BY MAX(timestamp) DESC
    LIMIT ?
"#;

const CWD_SQL: &str = r#"
    SELECT command, cwd, session, timestamp
    FROM history
    WHERE cwd = ? AND deleted_at IS NULL
    ORDER BY timestamp DESC
    LIMIT ?
"#;

const SESSION_SQL: &str = r#"
    SELECT command, cwd, session, timestamp
    FROM history
    WHERE session = ? AND deleted_at IS NULL
    ORDER BY timestamp DESC
    LIMIT ?
"#;

const CWD_PROCESS_SQL: &str = r#"
    SELECT command, cwd, session, timestamp
    FROM history
    WHERE cwd = ? AND instr(command, ?) = 1 AND deleted_at IS NULL
    ORDER BY timestamp DESC
    LIMIT ?
"#;

/// A read-only view of an Atuin history database.
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    /// Open an existing Atuin database file.
    ///
    /// A missing or unreadable file is [`HistoryError::Unavailable`]; the
    /// database is never created.
    pub async fn open(path: &Path) -> Result<Self, HistoryError> {
        if !path.exists() {
            return Err(HistoryError::Unavailable(format!(
                "no history database at {}",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                HistoryError::Unavailable(format!("failed to open {}: {e}", path.display()))
            })?;

        info!("Atuin history opened at {}", path.display());
        Ok(Self { pool })
    }

    /// Wrap an existing pool (useful for testing).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Parse a `HistoryEntry` from a SQLite row.
    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryEntry, HistoryError> {
        let column = |name: &str, e: sqlx::Error| {
            HistoryError::QueryFailed(format!("{name} column: {e}"))
        };

        Ok(HistoryEntry {
            command: row.try_get("command").map_err(|e| column("command", e))?,
            cwd: row.try_get("cwd").map_err(|e| column("cwd", e))?,
            session: row.try_get("session").map_err(|e| column("session", e))?,
            timestamp: row.try_get("timestamp").map_err(|e| column("timestamp", e))?,
        })
    }
}

#[async_trait]
impl HistorySource for SqliteHistory {
    fn name(&self) -> &str {
        "atuin"
    }

    async fn query(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>, HistoryError> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        let statement = match &query.filter {
            HistoryFilter::Process { prefix } => sqlx::query(PROCESS_SQL).bind(prefix).bind(limit),
            HistoryFilter::Cwd { cwd } => sqlx::query(CWD_SQL).bind(cwd).bind(limit),
            HistoryFilter::Session { session } => {
                sqlx::query(SESSION_SQL).bind(session).bind(limit)
            }
            HistoryFilter::CwdProcess { cwd, prefix } => sqlx::query(CWD_PROCESS_SQL)
                .bind(cwd)
                .bind(prefix)
                .bind(limit),
        };

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| HistoryError::QueryFailed(e.to_string()))?;

        let entries = rows
            .iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(filter = ?query.filter, limit = query.limit, rows = entries.len(), "History query");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATUIN_SCHEMA: &str = r#"
        CREATE TABLE history (
            id TEXT PRIMARY KEY,
            timestamp INTEGER NOT NULL,
            duration INTEGER NOT NULL,
            exit INTEGER NOT NULL,
            command TEXT NOT NULL,
            cwd TEXT NOT NULL,
            session TEXT NOT NULL,
            hostname TEXT NOT NULL,
            deleted_at INTEGER,
            UNIQUE(timestamp, cwd, command)
        )
    "#;

    async fn test_history(rows: &[(&str, &str, &str, i64)]) -> SqliteHistory {
        // One connection: every in-memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(ATUIN_SCHEMA).execute(&pool).await.unwrap();

        for (i, (command, cwd, session, timestamp)) in rows.iter().enumerate() {
            sqlx::query(
                "INSERT INTO history (id, timestamp, duration, exit, command, cwd, session, hostname)
                 VALUES (?, ?, 0, 0, ?, ?, ?, 'host:user')",
            )
            .bind(format!("id{i}"))
            .bind(timestamp)
            .bind(command)
            .bind(cwd)
            .bind(session)
            .execute(&pool)
            .await
            .unwrap();
        }

        SqliteHistory::from_pool(pool)
    }

    fn commands(entries: &[HistoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.command.as_str()).collect()
    }

    fn sample_rows() -> Vec<(&'static str, &'static str, &'static str, i64)> {
        vec![
            ("git add .", "/repo", "s1", 100),
            ("ls", "/repo", "s2", 200),
            ("git log", "/tmp", "s1", 300),
            ("git status", "/repo", "s2", 400),
            ("git log", "/repo", "s2", 500),
            ("GIT_DIR=x git log", "/repo", "s2", 600),
        ]
    }

    #[tokio::test]
    async fn process_query_dedups_and_orders_by_latest_use() {
        let db = test_history(&sample_rows()).await;
        let rows = db
            .query(&HistoryQuery::new(
                HistoryFilter::Process {
                    prefix: "git".into(),
                },
                10,
            ))
            .await
            .unwrap();
        assert_eq!(commands(&rows), vec!["git log", "git status", "git add ."]);
        assert_eq!(rows[0].timestamp, 500);
    }

    #[tokio::test]
    async fn process_prefix_is_case_sensitive() {
        let db = test_history(&[("Git status", "/", "s", 1), ("git log", "/", "s", 2)]).await;
        let rows = db
            .query(&HistoryQuery::new(
                HistoryFilter::Process {
                    prefix: "git".into(),
                },
                10,
            ))
            .await
            .unwrap();
        assert_eq!(commands(&rows), vec!["git log"]);
    }

    #[tokio::test]
    async fn cwd_query_is_not_deduplicated() {
        let mut rows = sample_rows();
        rows.push(("ls", "/repo", "s3", 700));
        let db = test_history(&rows).await;
        let rows = db
            .query(&HistoryQuery::new(
                HistoryFilter::Cwd {
                    cwd: "/repo".into(),
                },
                4,
            ))
            .await
            .unwrap();
        assert_eq!(
            commands(&rows),
            vec!["ls", "GIT_DIR=x git log", "git log", "git status"]
        );
    }

    #[tokio::test]
    async fn session_query() {
        let db = test_history(&sample_rows()).await;
        let rows = db
            .query(&HistoryQuery::new(
                HistoryFilter::Session {
                    session: "s1".into(),
                },
                10,
            ))
            .await
            .unwrap();
        assert_eq!(commands(&rows), vec!["git log", "git add ."]);
    }

    #[tokio::test]
    async fn cwd_process_query() {
        let db = test_history(&sample_rows()).await;
        let rows = db
            .query(&HistoryQuery::new(
                HistoryFilter::CwdProcess {
                    cwd: "/repo".into(),
                    prefix: "git".into(),
                },
                2,
            ))
            .await
            .unwrap();
        assert_eq!(commands(&rows), vec!["git log", "git status"]);
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_skipped() {
        let db = test_history(&sample_rows()).await;
        sqlx::query("UPDATE history SET deleted_at = 1 WHERE command = 'git status'")
            .execute(&db.pool)
            .await
            .unwrap();
        let rows = db
            .query(&HistoryQuery::new(
                HistoryFilter::Process {
                    prefix: "git".into(),
                },
                10,
            ))
            .await
            .unwrap();
        assert_eq!(commands(&rows), vec!["git log", "git add ."]);
    }

    #[tokio::test]
    async fn zero_limit_skips_the_database() {
        let db = test_history(&sample_rows()).await;
        let rows = db
            .query(&HistoryQuery::new(
                HistoryFilter::Session {
                    session: "s2".into(),
                },
                0,
            ))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn missing_table_is_a_query_error() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let db = SqliteHistory::from_pool(pool);
        let err = db
            .query(&HistoryQuery::new(
                HistoryFilter::Cwd { cwd: "/".into() },
                5,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::QueryFailed(_)));
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteHistory::open(&dir.path().join("history.db"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, HistoryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn backend_name() {
        let db = test_history(&[]).await;
        assert_eq!(db.name(), "atuin");
    }
}
