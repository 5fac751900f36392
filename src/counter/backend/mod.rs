//! Counter Store Abstraction
//!
//! This module provides a trait-based abstraction for the stores that hold
//! per-class running totals. Three interchangeable backends implement the same
//! contract: additive updates, no lost updates under concurrency, and labels
//! that were never counted omitted from reads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ CountDetectedObjects│
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │    CounterStore     │  <-- Trait
//! │      (async)        │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┼──────────────┐
//!     │      │              │
//! ┌───▼───┐ ┌▼──────────┐ ┌─▼──────────┐
//! │Memory │ │ DocumentDB│ │ Relational │
//! │Backend│ │  Backend  │ │  Backend   │
//! └───────┘ └───────────┘ └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use object_counter::counter::backend::{BackendKind, CounterStoreBuilder};
//! use object_counter::counter::Count;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = CounterStoreBuilder::new(BackendKind::Memory).build().await?;
//!
//!     store.update(&[Count::new("cat", 2), Count::new("dog", 1)]).await?;
//!     let totals = store.read(None).await?;
//!
//!     Ok(())
//! }
//! ```

mod memory_backend;
mod traits;

pub use memory_backend::*;
pub use traits::*;

#[cfg(feature = "storage-documentdb")]
mod documentdb_backend;

#[cfg(feature = "storage-documentdb")]
pub use documentdb_backend::DocumentDbCounterStore;

#[cfg(feature = "storage-relational")]
mod relational_backend;

#[cfg(feature = "storage-relational")]
pub use relational_backend::RelationalCounterStore;
