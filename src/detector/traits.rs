//! Detector trait and errors

use async_trait::async_trait;

/// Result type for detection operations
pub type DetectionResult<T> = Result<T, DetectionError>;

/// Error types for detection operations
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// The image could not be read or decoded
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The inference call itself failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// The inference service answered with something unparseable
    #[error("Invalid detector response: {0}")]
    InvalidResponse(String),
}

/// An object detector.
///
/// Maps image bytes and a confidence threshold to the class labels detected
/// in the image, one entry per detected object. The threshold is passed
/// through as given; range handling is up to the implementation.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Name used in logs
    fn detector_name(&self) -> &str;

    /// Detect objects in `image` scoring at least `threshold`
    async fn detect(&self, image: &[u8], threshold: f32) -> DetectionResult<Vec<String>>;
}
