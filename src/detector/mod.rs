//! Object detection capability consumed by the counting actions.
//!
//! Inference itself lives outside this crate. Implement [`ObjectDetector`] for
//! the inference service in use; [`FakeObjectDetector`] covers development and
//! tests.

mod fake;
mod traits;

pub use fake::FakeObjectDetector;
pub use traits::{DetectionError, DetectionResult, ObjectDetector};
