//! Detect objects without counting them

use std::sync::Arc;
use tracing::debug;

use super::ActionResult;
use crate::counter::models::DetectionResponse;
use crate::detector::ObjectDetector;

/// Runs the detector only; no store is involved.
pub struct DetectObjects {
    detector: Arc<dyn ObjectDetector>,
}

impl DetectObjects {
    /// Create the action
    pub fn new(detector: Arc<dyn ObjectDetector>) -> Self {
        Self { detector }
    }

    /// Labels detected in `image` at or above `threshold`
    pub async fn execute(&self, image: &[u8], threshold: f32) -> ActionResult<DetectionResponse> {
        let labels = self.detector.detect(image, threshold).await?;
        debug!(
            detector = self.detector.detector_name(),
            detected = labels.len(),
            "objects detected"
        );
        Ok(DetectionResponse { labels })
    }
}
