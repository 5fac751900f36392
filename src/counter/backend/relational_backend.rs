//! Relational Counter Backend
//!
//! Running totals stored in an SQLite table, one row per class label:
//!
//! ```sql
//! CREATE TABLE object_counter (
//!     class_label TEXT PRIMARY KEY NOT NULL,
//!     count       INTEGER NOT NULL
//! );
//! ```
//!
//! Every call opens its own connection. Updates run inside a single
//! `BEGIN IMMEDIATE` transaction that upserts `count = count + delta`, so two
//! writers can neither both insert the same label nor both increment from the
//! same prior value.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::traits::{coalesce_deltas, requested_labels, CounterStore, StoreError, StoreResult};
use crate::counter::models::Count;

const CREATE_SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS object_counter (
    class_label TEXT PRIMARY KEY NOT NULL CHECK (length(class_label) > 0),
    count       INTEGER NOT NULL CHECK (typeof(count) = 'integer' AND count >= 0)
)";

const SELECT_SQL: &str = "SELECT class_label, count FROM object_counter";

/// Labels bound per filtered `SELECT`; stays under SQLite's host parameter
/// limit on every build (999 before 3.32).
const FILTER_CHUNK_LEN: usize = 500;

const UPSERT_SQL: &str = "INSERT INTO object_counter (class_label, count) VALUES (?1, ?2)
    ON CONFLICT(class_label) DO UPDATE SET count = count + excluded.count";

/// SQLite counter store
pub struct RelationalCounterStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl RelationalCounterStore {
    /// Open (creating if needed) the counter table in the database at `path`.
    ///
    /// `busy_timeout` bounds how long a writer waits for a competing
    /// transaction before failing with [`StoreError::Conflict`].
    pub async fn open(path: impl Into<PathBuf>, busy_timeout: Duration) -> StoreResult<Self> {
        let store = Self {
            path: path.into(),
            busy_timeout,
        };

        store
            .with_connection(|conn| conn.execute_batch(CREATE_SCHEMA_SQL).map_err(map_sql_error))
            .await?;

        debug!(backend = "relational", path = %store.path.display(), "counter table ready");
        Ok(store)
    }

    /// Database file backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` on a fresh connection off the async runtime.
    async fn with_connection<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;

        tokio::task::spawn_blocking(move || {
            let mut conn = connect(&path, busy_timeout)?;
            op(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("database task failed: {}", e)))?
    }
}

fn connect(path: &Path, busy_timeout: Duration) -> StoreResult<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| StoreError::Connection(format!("{}: {}", path.display(), e)))?;
    conn.busy_timeout(busy_timeout).map_err(map_sql_error)?;
    Ok(conn)
}

fn map_sql_error(err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            StoreError::Conflict(err.to_string())
        }
        Some(ErrorCode::CannotOpen) => StoreError::Connection(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

fn select_sql(filter_len: usize) -> String {
    if filter_len == 0 {
        return SELECT_SQL.to_string();
    }
    let placeholders = vec!["?"; filter_len].join(", ");
    format!("{} WHERE class_label IN ({})", SELECT_SQL, placeholders)
}

fn query_counts(conn: &Connection, sql: &str, labels: &[String]) -> StoreResult<Vec<Count>> {
    let mut stmt = conn.prepare_cached(sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params_from_iter(labels.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(map_sql_error)?;

    let mut counts = Vec::new();
    for row in rows {
        let (label, count) = row.map_err(map_sql_error)?;
        let quantity = u64::try_from(count).map_err(|_| {
            StoreError::InvalidData(format!("count of '{}' is negative: {}", label, count))
        })?;
        counts.push(Count::new(label, quantity));
    }
    Ok(counts)
}

#[async_trait]
impl CounterStore for RelationalCounterStore {
    fn backend_type(&self) -> &'static str {
        "relational"
    }

    async fn is_available(&self) -> bool {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(map_sql_error)
        })
        .await
        .is_ok()
    }

    async fn read(&self, labels: Option<&[String]>) -> StoreResult<Vec<Count>> {
        let filter: Vec<String> = requested_labels(labels)
            .map(|labels| labels.into_iter().map(str::to_string).collect())
            .unwrap_or_default();

        self.with_connection(move |conn| {
            if filter.is_empty() {
                return query_counts(conn, SELECT_SQL, &[]);
            }

            // Requested labels are distinct, so the chunks select disjoint rows.
            let mut counts = Vec::new();
            for chunk in filter.chunks(FILTER_CHUNK_LEN) {
                counts.extend(query_counts(conn, &select_sql(chunk.len()), chunk)?);
            }
            Ok(counts)
        })
        .await
    }

    async fn update(&self, deltas: &[Count]) -> StoreResult<()> {
        let increments = coalesce_deltas(deltas)?
            .into_iter()
            .map(|(label, delta)| {
                i64::try_from(delta)
                    .map(|delta| (label.to_string(), delta))
                    .map_err(|_| StoreError::Overflow(label.to_string()))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        if increments.is_empty() {
            return Ok(());
        }

        self.with_connection(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;
            {
                let mut stmt = tx.prepare_cached(UPSERT_SQL).map_err(map_sql_error)?;
                for (label, delta) in &increments {
                    stmt.execute(params![label, delta]).map_err(map_sql_error)?;
                    debug!(backend = "relational", class_label = %label, delta, "count incremented");
                }
            }
            tx.commit().map_err(map_sql_error)
        })
        .await
    }
}
