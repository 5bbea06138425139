//! Image inference integration
//!
//! Provides the provider-agnostic [`ImageInferenceService`] seam and the
//! Runware implementation behind it.

pub mod mock;
pub mod runware;

pub use mock::MockImageInferenceClient;
pub use runware::RunwareImageClient;

use crate::models::{GenerationRequest, ImageResult};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageInferenceService: Send + Sync {
    /// Run one inference task. A single attempt: no retries, no client-side timeout.
    async fn image_inference(&self, request: &GenerationRequest) -> Result<Vec<ImageResult>>;
}
