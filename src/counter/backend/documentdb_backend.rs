//! DocumentDB/MongoDB Counter Backend
//!
//! Running totals stored as one document per class label, updated with the
//! server's atomic upsert-with-increment so concurrent writers need no
//! external locking.
//!
//! ## Usage
//!
//! Enable the `storage-documentdb` feature in Cargo.toml:
//!
//! ```toml
//! object-counter = { version = "0.3", features = ["storage-documentdb"] }
//! ```
//!
//! ```rust,no_run
//! use object_counter::counter::backend::{CounterStore, DocumentDbCounterStore};
//! use object_counter::counter::Count;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = DocumentDbCounterStore::new(
//!         "mongodb://localhost:27017",
//!         "prod_counter",
//!         "counter",
//!     )
//!     .await?;
//!
//!     store.update(&[Count::new("cat", 2)]).await?;
//!     let totals = store.read(None).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Document layout
//!
//! ```text
//! { "_id": "cat", "class_label": "cat", "count": NumberLong(5) }
//! ```

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::ClientOptions,
    Client, Collection,
};
use tracing::{debug, warn};

use super::traits::{coalesce_deltas, requested_labels, CounterStore, StoreError, StoreResult};
use crate::counter::models::Count;

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// DocumentDB/MongoDB counter store
///
/// Holds the driver's pooled [`Client`] for its whole lifetime.
pub struct DocumentDbCounterStore {
    client: Client,
    collection: Collection<Document>,
    database_name: String,
}

impl DocumentDbCounterStore {
    /// Create a new DocumentDB counter store
    ///
    /// # Arguments
    /// * `connection_string` - MongoDB/DocumentDB connection string
    /// * `database` - Database name
    /// * `collection` - Collection holding the counter documents
    pub async fn new(
        connection_string: &str,
        database: &str,
        collection: &str,
    ) -> StoreResult<Self> {
        let client_options = ClientOptions::parse(connection_string)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let client = Client::with_options(client_options)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let coll = client.database(database).collection::<Document>(collection);

        debug!(
            backend = "documentdb",
            database, collection, "counter store created"
        );

        Ok(Self {
            client,
            collection: coll,
            database_name: database.to_string(),
        })
    }

    /// Build a connection string from discrete settings.
    ///
    /// Credentials are percent-encoded and only included when `user` is set.
    pub fn connection_string(host: &str, port: u16, user: &str, password: &str) -> String {
        if user.is_empty() {
            format!("mongodb://{}:{}", host, port)
        } else {
            format!(
                "mongodb://{}:{}@{}:{}",
                urlencoding::encode(user),
                urlencoding::encode(password),
                host,
                port
            )
        }
    }

    /// Get the collection (for advanced operations)
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    /// Atomically add `delta` to one label's document, creating it if needed.
    ///
    /// Only this label is atomic. [`CounterStore::update`] calls this once per
    /// label, so a failure mid-batch leaves the earlier labels applied and a
    /// whole-batch retry would count them twice.
    async fn increment(&self, label: &str, delta: i64) -> mongodb::error::Result<()> {
        let filter = label_filter(label);
        let update = increment_update(label, delta);

        // Two upserts racing to create the same document can lose the insert
        // race with a duplicate key error; the second attempt matches the
        // winner's document and increments it.
        match self
            .collection
            .update_one(filter.clone(), update.clone())
            .upsert(true)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                debug!(backend = "documentdb", class_label = label, "upsert raced, retrying");
                self.collection
                    .update_one(filter, update)
                    .upsert(true)
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CounterStore for DocumentDbCounterStore {
    fn backend_type(&self) -> &'static str {
        "documentdb"
    }

    async fn is_available(&self) -> bool {
        self.client
            .database(&self.database_name)
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }

    async fn read(&self, labels: Option<&[String]>) -> StoreResult<Vec<Count>> {
        let filter = match requested_labels(labels) {
            Some(labels) => membership_filter(labels.into_iter()),
            None => doc! {},
        };

        let mut cursor = self
            .collection
            .find(filter)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut counts = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            counts.push(document_to_count(&doc)?);
        }

        Ok(counts)
    }

    /// Labels are upserted one at a time. When one fails, the labels before
    /// it stay applied and the returned error lists them.
    async fn update(&self, deltas: &[Count]) -> StoreResult<()> {
        let merged = coalesce_deltas(deltas)?;

        // Convert everything up front so a bad delta fails before any write.
        let increments = merged
            .into_iter()
            .map(|(label, delta)| {
                i64::try_from(delta)
                    .map(|delta| (label, delta))
                    .map_err(|_| StoreError::Overflow(label.to_string()))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        for (applied, (label, delta)) in increments.iter().enumerate() {
            if let Err(e) = self.increment(label, *delta).await {
                warn!(
                    backend = "documentdb",
                    class_label = *label,
                    applied,
                    remaining = increments.len() - applied,
                    "counter update failed: {}",
                    e
                );
                return Err(partial_update_error(&increments[..applied], label, &e));
            }
            debug!(backend = "documentdb", class_label = *label, delta, "count incremented");
        }

        Ok(())
    }
}

fn partial_update_error(
    applied: &[(&str, i64)],
    failed: &str,
    err: &impl std::fmt::Display,
) -> StoreError {
    if applied.is_empty() {
        return StoreError::Backend(format!("increment of '{}' failed: {}", failed, err));
    }
    let applied: Vec<&str> = applied.iter().map(|(label, _)| *label).collect();
    StoreError::Backend(format!(
        "increment of '{}' failed after applying [{}]: {}",
        failed,
        applied.join(", "),
        err
    ))
}

fn label_filter(label: &str) -> Document {
    doc! { "_id": label }
}

fn membership_filter<'a>(labels: impl Iterator<Item = &'a str>) -> Document {
    let labels: Vec<String> = labels.map(str::to_string).collect();
    doc! { "_id": { "$in": labels } }
}

fn increment_update(label: &str, delta: i64) -> Document {
    doc! {
        "$inc": { "count": delta },
        "$setOnInsert": { "class_label": label },
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

fn document_to_count(doc: &Document) -> StoreResult<Count> {
    let label = doc
        .get_str("class_label")
        .or_else(|_| doc.get_str("_id"))
        .map_err(|_| StoreError::InvalidData("counter document without a class label".into()))?;

    let quantity = match doc.get("count") {
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Int32(n)) => i64::from(*n),
        other => {
            return Err(StoreError::InvalidData(format!(
                "count of '{}' is not an integer: {:?}",
                label, other
            )))
        }
    };

    let quantity = u64::try_from(quantity).map_err(|_| {
        StoreError::InvalidData(format!("count of '{}' is negative: {}", label, quantity))
    })?;

    Ok(Count::new(label, quantity))
}

#[cfg(test)]
mod tests {
    // Tests marked #[ignore] require a running MongoDB instance
    // Run with: cargo test --features storage-documentdb -- --ignored

    use super::*;

    #[test]
    fn test_partial_update_error_names_applied_labels() {
        let err = partial_update_error(&[("cat", 2), ("dog", 1)], "fox", &"connection reset");
        assert_eq!(
            err.to_string(),
            "Backend error: increment of 'fox' failed after applying [cat, dog]: connection reset"
        );

        let err = partial_update_error(&[], "cat", &"connection reset");
        assert_eq!(
            err.to_string(),
            "Backend error: increment of 'cat' failed: connection reset"
        );
    }

    #[test]
    fn test_increment_update_shape() {
        let update = increment_update("cat", 3);
        assert_eq!(update.get_document("$inc").unwrap().get_i64("count").unwrap(), 3);
        assert_eq!(
            update.get_document("$setOnInsert").unwrap().get_str("class_label").unwrap(),
            "cat"
        );
    }

    #[test]
    fn test_membership_filter() {
        let filter = membership_filter(["a", "c"].into_iter());
        let labels = filter.get_document("_id").unwrap().get_array("$in").unwrap();
        assert_eq!(labels, &vec![Bson::from("a"), Bson::from("c")]);
    }

    #[test]
    fn test_document_to_count_accepts_both_integer_widths() {
        let doc = doc! { "_id": "cat", "class_label": "cat", "count": 5_i64 };
        assert_eq!(document_to_count(&doc).unwrap(), Count::new("cat", 5));

        let doc = doc! { "_id": "dog", "count": 2_i32 };
        assert_eq!(document_to_count(&doc).unwrap(), Count::new("dog", 2));
    }

    #[test]
    fn test_document_to_count_rejects_bad_counts() {
        let doc = doc! { "_id": "cat", "class_label": "cat", "count": -1_i64 };
        assert!(matches!(document_to_count(&doc), Err(StoreError::InvalidData(_))));

        let doc = doc! { "_id": "cat", "class_label": "cat", "count": "five" };
        assert!(matches!(document_to_count(&doc), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_connection_string() {
        assert_eq!(
            DocumentDbCounterStore::connection_string("localhost", 27017, "", ""),
            "mongodb://localhost:27017"
        );
        assert_eq!(
            DocumentDbCounterStore::connection_string("db", 27017, "counter", "p@ss"),
            "mongodb://counter:p%40ss@db:27017"
        );
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_documentdb_backend_basic() {
        let store = DocumentDbCounterStore::new(
            "mongodb://localhost:27017",
            "test_counter",
            "counter_basic",
        )
        .await
        .expect("Failed to connect to MongoDB");

        assert!(store.is_available().await);
        assert_eq!(store.backend_type(), "documentdb");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_documentdb_first_write_creates() {
        let store = DocumentDbCounterStore::new(
            "mongodb://localhost:27017",
            "test_counter",
            "counter_first_write",
        )
        .await
        .expect("Failed to connect to MongoDB");
        store.collection().drop().await.unwrap();

        store.update(&[Count::new("dog", 4)]).await.unwrap();
        assert_eq!(store.read_one("dog").await.unwrap(), Some(Count::new("dog", 4)));
    }
}
