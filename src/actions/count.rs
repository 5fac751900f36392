//! Detect objects and accumulate their counts

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ActionResult, CountError};
use crate::counter::models::{sort_by_label, Count, CountResponse};
use crate::counter::CounterStore;
use crate::detector::ObjectDetector;

/// Counts detected objects per class and adds them to the running totals.
pub struct CountDetectedObjects {
    detector: Arc<dyn ObjectDetector>,
    store: Arc<dyn CounterStore>,
}

impl CountDetectedObjects {
    /// Create the action from a detector and the store it feeds
    pub fn new(detector: Arc<dyn ObjectDetector>, store: Arc<dyn CounterStore>) -> Self {
        Self { detector, store }
    }

    /// Store receiving the counts
    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    /// Detect objects in `image`, add this request's per-class counts to the
    /// store in a single update, and return them along with the new totals.
    ///
    /// A failure of the final totals read is reported as
    /// [`CountError::ReadBack`], since the update has already been applied.
    pub async fn execute(&self, image: &[u8], threshold: f32) -> ActionResult<CountResponse> {
        let labels = self
            .detector
            .detect(image, threshold)
            .await
            .map_err(|e| {
                warn!(detector = self.detector.detector_name(), "detection failed: {}", e);
                CountError::from(e)
            })?;
        debug!(
            detector = self.detector.detector_name(),
            detected = labels.len(),
            threshold,
            "objects detected"
        );

        let current_objects = tally(&labels);

        self.store.update(&current_objects).await.map_err(|e| {
            warn!(backend = self.store.backend_type(), "counter update failed: {}", e);
            CountError::from(e)
        })?;

        let mut total_objects = self.store.read(None).await.map_err(|e| {
            warn!(
                backend = self.store.backend_type(),
                classes = current_objects.len(),
                "counts recorded but totals read failed: {}",
                e
            );
            CountError::ReadBack(e)
        })?;
        sort_by_label(&mut total_objects);

        info!(
            backend = self.store.backend_type(),
            classes = current_objects.len(),
            objects = labels.len(),
            "counts recorded"
        );

        Ok(CountResponse {
            current_objects,
            total_objects,
        })
    }
}

/// Per-class occurrences of `labels`, sorted by label.
fn tally(labels: &[String]) -> Vec<Count> {
    let mut occurrences: BTreeMap<&str, u64> = BTreeMap::new();
    for label in labels {
        *occurrences.entry(label.as_str()).or_insert(0) += 1;
    }
    occurrences
        .into_iter()
        .map(|(label, quantity)| Count::new(label, quantity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_groups_labels() {
        let labels: Vec<String> = ["dog", "cat", "cat"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tally(&labels), vec![Count::new("cat", 2), Count::new("dog", 1)]);
        assert!(tally(&[]).is_empty());
    }
}
