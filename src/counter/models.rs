//! Data models for object counting

use serde::{Deserialize, Serialize};

/// A class label paired with a quantity.
///
/// Used both as a stored running total and as a delta submitted to
/// [`CounterStore::update`](super::CounterStore::update). Serializes as
/// `{"object_class": ..., "count": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Count {
    #[serde(rename = "object_class")]
    class_label: String,
    #[serde(rename = "count")]
    quantity: u64,
}

impl Count {
    /// Create a new count
    pub fn new(class_label: impl Into<String>, quantity: u64) -> Self {
        Self {
            class_label: class_label.into(),
            quantity,
        }
    }

    /// Class label (case-sensitive)
    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    /// Quantity for the label
    pub fn quantity(&self) -> u64 {
        self.quantity
    }
}

/// Response of a counting request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    /// Objects counted in this request, sorted by label
    pub current_objects: Vec<Count>,
    /// Running totals after the update, sorted by label
    pub total_objects: Vec<Count>,
}

/// Response of a detection-only request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResponse {
    /// Labels detected at or above the threshold, in detector order
    pub labels: Vec<String>,
}

/// Sort counts by label, for stable output from backends without ordering.
pub fn sort_by_label(counts: &mut [Count]) {
    counts.sort_by(|a, b| a.class_label.cmp(&b.class_label));
}
