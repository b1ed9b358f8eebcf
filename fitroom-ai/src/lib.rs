pub mod client;
pub mod error;
pub mod json;
pub mod models;
pub mod provider;
pub mod retry;
pub mod traits;

// Re-export public APIs
pub use client::GenerationGateway;
pub use error::{GatewayError, TransportError};
pub use models::{ContentPart, GeneratedImage, ImageInput, ImageRequest, JsonRequest, ProviderConfig};
pub use provider::GeminiProvider;
pub use retry::RetryPolicy;
pub use traits::ModelTransport;
