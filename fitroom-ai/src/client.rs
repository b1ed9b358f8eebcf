use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use uuid::Uuid;
use fitroom_common::traits::schema_traits::ResponseSchema;

use crate::error::GatewayError;
use crate::json::{parse_structured, REPAIR_INSTRUCTION};
use crate::models::{
    ContentPart, GeneratedImage, ImageRequest, JsonRequest, ModelRequest, ModelResponse, OutputKind,
};
use crate::retry::RetryPolicy;
use crate::traits::ModelTransport;

pub const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(25);
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a structured call stands in its two-attempt repair sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepairStage {
    Initial,
    Repair,
}

/// Call/validate/retry wrapper around a [`ModelTransport`].
///
/// Transport failures (429, 5xx, network) are retried with backoff; a timeout
/// aborts the call without retrying; structurally invalid JSON gets exactly one
/// repair attempt with a stricter prompt.
pub struct GenerationGateway {
    transport: Arc<dyn ModelTransport>,
    retry: RetryPolicy,
    text_timeout: Duration,
    image_timeout: Duration,
}

impl GenerationGateway {
    pub fn new(transport: Arc<dyn ModelTransport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            text_timeout: DEFAULT_TEXT_TIMEOUT,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Calls the model for JSON output and returns it parsed and validated as `T`.
    pub async fn generate_json<T: ResponseSchema>(&self, request: &JsonRequest) -> Result<T, GatewayError> {
        let request_id = Uuid::new_v4().to_string();
        let timeout = request.timeout.unwrap_or(self.text_timeout);
        let mut stage = RepairStage::Initial;

        loop {
            let prompt = match stage {
                RepairStage::Initial => request.prompt.clone(),
                RepairStage::Repair => format!("{}\n\n{}", request.prompt, REPAIR_INSTRUCTION),
            };
            let mut parts = Vec::with_capacity(request.images.len() + 1);
            parts.push(ContentPart::Text(prompt));
            parts.extend(request.images.iter().cloned().map(ContentPart::Image));
            let model_request = ModelRequest {
                model: request.model.clone(),
                parts,
                output: OutputKind::Json,
            };

            let response = self.call(&request_id, &model_request, timeout).await?;
            match parse_structured::<T>(&response.joined_text()) {
                Ok(value) => return Ok(value),
                Err(reason) if stage == RepairStage::Initial => {
                    warn!(request_id = %request_id, error = %reason, "parse_error, sending repair prompt");
                    stage = RepairStage::Repair;
                }
                Err(reason) => {
                    warn!(request_id = %request_id, error = %reason, "parse_error after repair");
                    return Err(GatewayError::Parse(reason));
                }
            }
        }
    }

    /// Calls the model for image output. A response without an image is a parse failure.
    pub async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, GatewayError> {
        let request_id = Uuid::new_v4().to_string();
        let timeout = request.timeout.unwrap_or(self.image_timeout);
        let model_request = ModelRequest {
            model: request.model.clone(),
            parts: request.parts.clone(),
            output: OutputKind::Image,
        };

        let response = self.call(&request_id, &model_request, timeout).await?;
        match response.first_image() {
            Some(image) => Ok(image),
            None => {
                warn!(request_id = %request_id, "parse_error: no image in response");
                Err(GatewayError::Parse("No image in response".to_string()))
            }
        }
    }

    /// One logical call: per-attempt timeout, transport retries with backoff.
    async fn call(
        &self,
        request_id: &str,
        request: &ModelRequest,
        timeout: Duration,
    ) -> Result<ModelResponse, GatewayError> {
        let start = Instant::now();
        let mut retries = 0u32;

        loop {
            let outcome = tokio::time::timeout(timeout, self.transport.generate(request)).await;
            let latency_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Err(_) => {
                    warn!(request_id, latency_ms, model = %request.model, "timeout");
                    return Err(GatewayError::Timeout(timeout));
                }
                Ok(Ok(response)) => {
                    info!(request_id, latency_ms, model = %request.model, "ok");
                    return Ok(response);
                }
                Ok(Err(err)) if err.is_retryable() && self.retry.allows(retries) => {
                    let backoff = self.retry.delay_for(retries);
                    retries += 1;
                    warn!(
                        request_id,
                        latency_ms,
                        attempt = retries,
                        retry_in_ms = backoff.as_millis() as u64,
                        error = %err,
                        "retry"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Ok(Err(err)) => {
                    error!(request_id, latency_ms, retries, error = %err, "error");
                    return Err(err.into());
                }
            }
        }
    }
}
