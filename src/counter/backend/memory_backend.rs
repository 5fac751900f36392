//! In-Memory Counter Backend
//!
//! Process-local running totals. Nothing is persisted; every instance starts
//! empty and is dropped with its owner.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::traits::{coalesce_deltas, requested_labels, CounterStore, StoreError, StoreResult};
use crate::counter::models::Count;

/// In-memory counter store
///
/// The whole update batch runs under one write lock, so concurrent updates
/// are serialized and never lose increments.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    totals: RwLock<HashMap<String, u64>>,
}

impl MemoryCounterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn read(&self, labels: Option<&[String]>) -> StoreResult<Vec<Count>> {
        let totals = self.totals.read().await;

        let counts = match requested_labels(labels) {
            None => totals
                .iter()
                .map(|(label, quantity)| Count::new(label.clone(), *quantity))
                .collect(),
            Some(filter) => filter
                .into_iter()
                .filter_map(|label| totals.get(label).map(|quantity| Count::new(label, *quantity)))
                .collect(),
        };

        Ok(counts)
    }

    async fn update(&self, deltas: &[Count]) -> StoreResult<()> {
        let merged = coalesce_deltas(deltas)?;
        if merged.is_empty() {
            return Ok(());
        }

        let mut totals = self.totals.write().await;

        // Stage first so a failing label leaves every total untouched.
        let mut staged = Vec::with_capacity(merged.len());
        for (label, delta) in merged {
            let previous = totals.get(label).copied().unwrap_or(0);
            let next = previous
                .checked_add(delta)
                .ok_or_else(|| StoreError::Overflow(label.to_string()))?;
            staged.push((label, next));
        }

        for (label, next) in staged {
            debug!(backend = "memory", class_label = label, total = next, "count updated");
            totals.insert(label.to_string(), next);
        }

        Ok(())
    }
}
