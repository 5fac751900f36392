//! Counter Store Traits
//!
//! Defines the storage-agnostic contract for per-class running totals and the
//! factory that turns a [`BackendKind`] into a concrete store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::counter::models::Count;

/// Result type for counter store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for counter store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// Generic backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// A concurrent writer held the store for too long; the update applied nothing
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// A submitted delta is malformed
    #[error("Invalid delta: {0}")]
    InvalidDelta(String),

    /// A stored record could not be interpreted as a count
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// The running total for a label no longer fits the backend's integer type
    #[error("Count overflow for class '{0}'")]
    Overflow(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Core trait for counter stores
///
/// Every backend reports labels that were never counted by omitting them from
/// [`read`](CounterStore::read) results; none of them emit zero placeholders.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Get the backend type name (e.g., "memory", "documentdb", "relational")
    fn backend_type(&self) -> &'static str;

    /// Check if the backend is available/connected
    async fn is_available(&self) -> bool;

    /// Read running totals.
    ///
    /// `None` or an empty slice returns every stored count. Otherwise one
    /// count is returned per requested label that has a record. No ordering
    /// is guaranteed.
    async fn read(&self, labels: Option<&[String]>) -> StoreResult<Vec<Count>>;

    /// Add every delta to the stored total of its label.
    ///
    /// Labels seen for the first time start at their delta. Repeated labels
    /// within one call are applied cumulatively, and concurrent callers never
    /// lose each other's increments.
    async fn update(&self, deltas: &[Count]) -> StoreResult<()>;

    /// Read a single label; `None` means the label was never counted.
    async fn read_one(&self, class_label: &str) -> StoreResult<Option<Count>> {
        let labels = [class_label.to_string()];
        Ok(self
            .read(Some(&labels))
            .await?
            .into_iter()
            .find(|count| count.class_label() == class_label))
    }
}

/// Deduplicated label filter, `None` for the read-everything case.
pub(crate) fn requested_labels(labels: Option<&[String]>) -> Option<BTreeSet<&str>> {
    match labels {
        Some(labels) if !labels.is_empty() => {
            Some(labels.iter().map(String::as_str).collect())
        }
        _ => None,
    }
}

/// Validate deltas and merge them per label.
///
/// Fails before anything is written when a label is empty or a label's
/// summed delta overflows.
pub(crate) fn coalesce_deltas(deltas: &[Count]) -> StoreResult<BTreeMap<&str, u64>> {
    let mut merged: BTreeMap<&str, u64> = BTreeMap::new();
    for delta in deltas {
        let label = delta.class_label();
        if label.is_empty() {
            return Err(StoreError::InvalidDelta(
                "class label must not be empty".to_string(),
            ));
        }
        let entry = merged.entry(label).or_insert(0);
        *entry = entry
            .checked_add(delta.quantity())
            .ok_or_else(|| StoreError::Overflow(label.to_string()))?;
    }
    Ok(merged)
}

/// The closed set of counter store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackendKind {
    /// Process-local map, lost on exit
    Memory,
    /// MongoDB / DocumentDB collection
    DocumentDb,
    /// SQLite table
    Relational,
}

impl BackendKind {
    /// Canonical name of the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::DocumentDb => "documentdb",
            BackendKind::Relational => "relational",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" => Ok(BackendKind::Memory),
            "documentdb" | "mongodb" | "mongo" => Ok(BackendKind::DocumentDb),
            "relational" | "sql" | "sqlite" => Ok(BackendKind::Relational),
            unknown => Err(StoreError::Configuration(format!(
                "Unknown backend type: {}",
                unknown
            ))),
        }
    }
}

impl TryFrom<String> for BackendKind {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BackendKind> for String {
    fn from(kind: BackendKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Default database name for the document backend
pub const DEFAULT_DATABASE: &str = "prod_counter";
/// Default collection name for the document backend
pub const DEFAULT_COLLECTION: &str = "counter";
/// Default busy timeout for the relational backend
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Builder for creating counter stores from configuration
pub struct CounterStoreBuilder {
    kind: BackendKind,
    config: HashMap<String, String>,
}

impl CounterStoreBuilder {
    /// Create a new builder
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            config: HashMap::new(),
        }
    }

    /// Add a configuration option
    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the connection string (for the document backend)
    pub fn with_uri(self, uri: &str) -> Self {
        self.with_option("uri", uri)
    }

    /// Set the database name (for the document backend)
    pub fn with_database(self, database: &str) -> Self {
        self.with_option("database", database)
    }

    /// Set the collection name (for the document backend)
    pub fn with_collection(self, collection: &str) -> Self {
        self.with_option("collection", collection)
    }

    /// Set the database file (for the relational backend)
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_option("path", &path.into().to_string_lossy())
    }

    /// Set how long a relational writer waits for a competing transaction
    pub fn with_busy_timeout_ms(self, timeout_ms: u64) -> Self {
        self.with_option("busy_timeout_ms", &timeout_ms.to_string())
    }

    /// Backend kind this builder produces
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Build the counter store
    pub async fn build(self) -> StoreResult<Box<dyn CounterStore>> {
        match self.kind {
            BackendKind::Memory => Ok(Box::new(super::MemoryCounterStore::new())),
            BackendKind::DocumentDb => self.build_documentdb().await,
            BackendKind::Relational => self.build_relational().await,
        }
    }

    #[cfg_attr(
        not(any(feature = "storage-documentdb", feature = "storage-relational")),
        allow(dead_code)
    )]
    fn require(&self, key: &str) -> StoreResult<&str> {
        self.config
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| StoreError::Configuration(format!("{} is required", key)))
    }

    #[cfg(feature = "storage-documentdb")]
    async fn build_documentdb(&self) -> StoreResult<Box<dyn CounterStore>> {
        let uri = self.require("uri")?;
        let database = self
            .config
            .get("database")
            .map(String::as_str)
            .unwrap_or(DEFAULT_DATABASE);
        let collection = self
            .config
            .get("collection")
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLLECTION);
        let store = super::DocumentDbCounterStore::new(uri, database, collection).await?;
        Ok(Box::new(store))
    }

    #[cfg(not(feature = "storage-documentdb"))]
    async fn build_documentdb(&self) -> StoreResult<Box<dyn CounterStore>> {
        Err(StoreError::Configuration(
            "documentdb backend requires the `storage-documentdb` feature".into(),
        ))
    }

    #[cfg(feature = "storage-relational")]
    async fn build_relational(&self) -> StoreResult<Box<dyn CounterStore>> {
        let path = self.require("path")?;
        let busy_timeout_ms = match self.config.get("busy_timeout_ms") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                StoreError::Configuration(format!("invalid busy_timeout_ms '{}': {}", raw, e))
            })?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };
        let store = super::RelationalCounterStore::open(
            path,
            std::time::Duration::from_millis(busy_timeout_ms),
        )
        .await?;
        Ok(Box::new(store))
    }

    #[cfg(not(feature = "storage-relational"))]
    async fn build_relational(&self) -> StoreResult<Box<dyn CounterStore>> {
        Err(StoreError::Configuration(
            "relational backend requires the `storage-relational` feature".into(),
        ))
    }
}
