//! Object counting: the count model and the stores that accumulate counts.

pub mod backend;
pub mod models;

pub use backend::{BackendKind, CounterStore, CounterStoreBuilder, StoreError, StoreResult};
pub use models::{Count, CountResponse, DetectionResponse};
