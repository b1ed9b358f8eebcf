use std::time::Duration;
use thiserror::Error;

/// Failure of a single transport round-trip, before any retry decision.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection refused/reset, DNS failure and similar.
    #[error("network error: {0}")]
    Network(String),

    /// The provider envelope itself could not be decoded.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// 429, 5xx and network failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            TransportError::Network(_) => true,
            TransportError::Malformed(_) | TransportError::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return TransportError::Status { status: status.as_u16(), message: err.to_string() };
        }
        if err.is_connect() || err.is_timeout() || err.is_request() {
            return TransportError::Network(err.to_string());
        }
        if err.is_decode() || err.is_body() {
            return TransportError::Malformed(err.to_string());
        }
        TransportError::Other(err.to_string())
    }
}

/// Final outcome of a gateway call, after retries and repair.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("model request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("model API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model network error: {0}")]
    Network(String),

    /// Output did not match the declared schema, even after the repair attempt.
    #[error("invalid model output: {0}")]
    Parse(String),

    #[error("model call failed: {0}")]
    Other(String),
}

impl GatewayError {
    /// Stable code persisted on failed generations.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Timeout(_) => "AI_TIMEOUT",
            GatewayError::Api { .. } => "AI_API_ERROR",
            GatewayError::Parse(_) => "AI_PARSE_ERROR",
            GatewayError::Network(_) | GatewayError::Other(_) => "AI_ERROR",
        }
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status, message } => GatewayError::Api { status, message },
            TransportError::Network(msg) => GatewayError::Network(msg),
            TransportError::Malformed(msg) => GatewayError::Other(msg),
            TransportError::Other(msg) => GatewayError::Other(msg),
        }
    }
}
