// File: fitroom-core/src/test_utils/transport.rs

use std::collections::VecDeque;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use fitroom_ai::error::TransportError;
use fitroom_ai::models::{ModelRequest, ModelResponse};
use fitroom_ai::ModelTransport;

/// Model transport that replays queued responses and records every request.
/// An exhausted script answers with `TransportError::Other`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ModelResponse, TransportError>>>,
    requests: Mutex<Vec<ModelRequest>>,
    delay: Mutex<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.script.lock().push_back(Ok(ModelResponse::text(text)));
    }

    pub fn push_image(&self, data: Vec<u8>, mime_type: &str) {
        self.script.lock().push_back(Ok(ModelResponse::image(data, mime_type)));
    }

    pub fn push_error(&self, err: TransportError) {
        self.script.lock().push_back(Err(err));
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ModelTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, TransportError> {
        self.requests.lock().push(request.clone());
        let next = self.script.lock().pop_front();
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(|| Err(TransportError::Other("script exhausted".into())))
    }
}
