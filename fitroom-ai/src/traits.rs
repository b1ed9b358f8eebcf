use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::{ModelRequest, ModelResponse};

/// One round-trip to a generative model. Implementations do no retrying and no
/// timeout handling; [`crate::GenerationGateway`] owns both.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, TransportError>;
}
