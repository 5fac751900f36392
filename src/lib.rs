//! Object Counter - per-class running totals for object detection results
//!
//! Object Counter tallies the class labels an object detector reports for an
//! image and accumulates them in a pluggable counter store:
//!
//! - **`counter`** - The [`Count`](counter::Count) model and the
//!   [`CounterStore`](counter::CounterStore) contract with its backends
//! - **`detector`** - The object detector capability consumed by the actions
//! - **`actions`** - `CountDetectedObjects` and `DetectObjects`
//! - **`config`** - TOML/environment configuration and action wiring
//! - **`observability`** - `tracing` subscriber setup
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! object-counter = { version = "0.3", features = ["storage-relational"] }
//! # Or enable every backend:
//! object-counter = { version = "0.3", features = ["all"] }
//! ```
//!
//! The in-memory backend is always available; `storage-documentdb` adds the
//! MongoDB/DocumentDB backend and `storage-relational` the SQLite backend.
//!
//! # Example
//!
//! ```ignore
//! use object_counter::actions::CountDetectedObjects;
//! use object_counter::counter::backend::{BackendKind, CounterStoreBuilder};
//! use object_counter::detector::FakeObjectDetector;
//! use std::sync::Arc;
//!
//! let store = CounterStoreBuilder::new(BackendKind::Relational)
//!     .with_path("counts.db")
//!     .build()
//!     .await?;
//! let action = CountDetectedObjects::new(Arc::new(FakeObjectDetector::default()), Arc::from(store));
//!
//! let response = action.execute(&image_bytes, 0.5).await?;
//! println!("{}", serde_json::to_string(&response)?);
//! ```

#![warn(missing_docs)]

/// Count model and counter stores
pub mod counter;

/// Object detector capability
pub mod detector;

/// Counting and detection actions
pub mod actions;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Observability utilities (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::actions::{CountDetectedObjects, CountError, DetectObjects};
    pub use crate::counter::{
        BackendKind, Count, CountResponse, CounterStore, CounterStoreBuilder, StoreError,
        StoreResult,
    };
    pub use crate::detector::{DetectionError, ObjectDetector};

    #[cfg(feature = "config")]
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};
}
