use async_trait::async_trait;

use crate::Result;
use crate::types::{GeneratedImage, ImageRequest, ProviderId};

/// Common contract every backend adapter normalizes to.
#[async_trait]
pub trait ImageModel: Send + Sync {
    fn provider(&self) -> ProviderId;

    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage>;
}
