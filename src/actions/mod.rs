//! Request-level actions that combine a detector with a counter store.
//!
//! # Example
//!
//! ```no_run
//! use object_counter::actions::CountDetectedObjects;
//! use object_counter::counter::backend::MemoryCounterStore;
//! use object_counter::detector::FakeObjectDetector;
//! use std::sync::Arc;
//!
//! async fn example(image: Vec<u8>) -> Result<(), object_counter::actions::CountError> {
//!     let action = CountDetectedObjects::new(
//!         Arc::new(FakeObjectDetector::default()),
//!         Arc::new(MemoryCounterStore::new()),
//!     );
//!     let response = action.execute(&image, 0.5).await?;
//!     println!("{:?}", response.total_objects);
//!     Ok(())
//! }
//! ```

mod count;
mod detect;

pub use count::CountDetectedObjects;
pub use detect::DetectObjects;

use crate::counter::StoreError;
use crate::detector::DetectionError;

/// Result type for actions
pub type ActionResult<T> = Result<T, CountError>;

/// Errors surfaced by an action as a request failure
#[derive(Debug, thiserror::Error)]
pub enum CountError {
    /// The detector could not process the image
    #[error("Detection failed: {0}")]
    Detection(#[from] DetectionError),

    /// The counter store rejected the update; none of this request's counts
    /// were applied and the request may be re-submitted
    #[error("Counter store failed: {0}")]
    Store(#[from] StoreError),

    /// This request's counts were applied, but the running totals could not
    /// be read back. Re-submitting the request would count it twice.
    #[error("Counts were recorded but the totals could not be read: {0}")]
    ReadBack(StoreError),
}
