//! Deterministic detector for development mode and tests

use async_trait::async_trait;

use super::traits::{DetectionError, DetectionResult, ObjectDetector};

/// Detector returning a fixed set of scored predictions for any non-empty image.
#[derive(Debug, Clone)]
pub struct FakeObjectDetector {
    predictions: Vec<(String, f32)>,
}

impl FakeObjectDetector {
    /// Create a detector with custom `(label, score)` predictions
    pub fn new(predictions: Vec<(String, f32)>) -> Self {
        Self { predictions }
    }

    /// Predictions this detector reports
    pub fn predictions(&self) -> &[(String, f32)] {
        &self.predictions
    }
}

impl Default for FakeObjectDetector {
    fn default() -> Self {
        Self::new(vec![
            ("cat".to_string(), 0.999),
            ("cat".to_string(), 0.998),
            ("dog".to_string(), 0.5),
        ])
    }
}

#[async_trait]
impl ObjectDetector for FakeObjectDetector {
    fn detector_name(&self) -> &str {
        "fake"
    }

    async fn detect(&self, image: &[u8], threshold: f32) -> DetectionResult<Vec<String>> {
        if image.is_empty() {
            return Err(DetectionError::InvalidImage("image is empty".to_string()));
        }

        Ok(self
            .predictions
            .iter()
            .filter(|(_, score)| *score >= threshold)
            .map(|(label, _)| label.clone())
            .collect())
    }
}
