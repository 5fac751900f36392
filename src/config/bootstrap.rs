//! Wiring of actions from configuration.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use super::config::{AppEnvironment, Configuration, StoreConfig};
use crate::actions::{CountDetectedObjects, DetectObjects};
use crate::counter::backend::{CounterStore, CounterStoreBuilder, MemoryCounterStore};
use crate::detector::{FakeObjectDetector, ObjectDetector};

/// Builder for the configured store.
pub fn store_builder(store: &StoreConfig) -> CounterStoreBuilder {
    let builder = CounterStoreBuilder::new(store.kind)
        .with_database(&store.database)
        .with_collection(&store.collection)
        .with_path(&store.path)
        .with_busy_timeout_ms(store.busy_timeout_ms);

    match connection_uri(store) {
        Some(uri) => builder.with_uri(&uri),
        None => builder,
    }
}

#[cfg(feature = "storage-documentdb")]
fn connection_uri(store: &StoreConfig) -> Option<String> {
    Some(store.uri.clone().unwrap_or_else(|| {
        crate::counter::backend::DocumentDbCounterStore::connection_string(
            &store.host,
            store.port,
            &store.user,
            &store.password,
        )
    }))
}

#[cfg(not(feature = "storage-documentdb"))]
fn connection_uri(store: &StoreConfig) -> Option<String> {
    store.uri.clone()
}

/// Build the configured counter store.
pub async fn build_counter_store(store: &StoreConfig) -> Result<Arc<dyn CounterStore>> {
    let built = store_builder(store)
        .build()
        .await
        .with_context(|| format!("Failed to create {} counter store", store.kind))?;
    Ok(Arc::from(built))
}

/// Build the counting action for the configured environment.
///
/// `dev` uses the fake detector and a fresh in-memory store. `prod` requires
/// `detector` and uses the configured store.
pub async fn count_action(
    config: &Configuration,
    detector: Option<Arc<dyn ObjectDetector>>,
) -> Result<CountDetectedObjects> {
    let action = match config.app.environment {
        AppEnvironment::Dev => CountDetectedObjects::new(
            Arc::new(FakeObjectDetector::default()),
            Arc::new(MemoryCounterStore::new()),
        ),
        AppEnvironment::Prod => {
            let detector = detector.context("prod environment requires an object detector")?;
            let store = build_counter_store(&config.store).await?;
            CountDetectedObjects::new(detector, store)
        }
    };

    info!(
        environment = %config.app.environment,
        backend = action.store().backend_type(),
        "count action ready"
    );
    Ok(action)
}

/// Build the detection-only action for the configured environment.
pub fn detect_action(
    config: &Configuration,
    detector: Option<Arc<dyn ObjectDetector>>,
) -> Result<DetectObjects> {
    match config.app.environment {
        AppEnvironment::Dev => Ok(DetectObjects::new(Arc::new(FakeObjectDetector::default()))),
        AppEnvironment::Prod => {
            let detector = detector.context("prod environment requires an object detector")?;
            Ok(DetectObjects::new(detector))
        }
    }
}
