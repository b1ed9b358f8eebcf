use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Configuration for the model provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for API requests
    pub api_base: Option<String>,

    /// API key for authentication. Never logged.
    pub api_key: String,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_base: None, api_key: api_key.into() }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// An inline image sent to, or received from, the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { data, mime_type: mime_type.into() }
    }
}

pub type GeneratedImage = ImageInput;

/// One element of an interleaved prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    Image(ImageInput),
}

/// What the provider is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Json,
    Image,
}

/// A single provider round-trip, as handed to a [`crate::ModelTransport`].
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
    pub output: OutputKind,
}

impl ModelRequest {
    /// The concatenated text parts, mostly useful for assertions and debugging.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn image_count(&self) -> usize {
        self.parts.iter().filter(|p| matches!(p, ContentPart::Image(_))).count()
    }
}

/// Provider output, already unwrapped from the provider's envelope.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub parts: Vec<ContentPart>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self { parts: vec![ContentPart::Text(text.into())] }
    }

    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { parts: vec![ContentPart::Image(ImageInput::new(data, mime_type))] }
    }

    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::Image(_) => None,
            })
            .collect::<String>()
    }

    pub fn first_image(self) -> Option<GeneratedImage> {
        self.parts.into_iter().find_map(|p| match p {
            ContentPart::Image(img) => Some(img),
            ContentPart::Text(_) => None,
        })
    }
}

/// Structured-output request: the prompt first, then any images.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    pub model: String,
    pub prompt: String,
    pub images: Vec<ImageInput>,
    /// Overrides the gateway's text timeout.
    pub timeout: Option<Duration>,
}

impl JsonRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { model: model.into(), prompt: prompt.into(), images: Vec::new(), timeout: None }
    }

    pub fn with_images(mut self, images: Vec<ImageInput>) -> Self {
        self.images = images;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Image-synthesis request with caller-controlled part order.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
    /// Overrides the gateway's image timeout.
    pub timeout: Option<Duration>,
}

impl ImageRequest {
    pub fn new(model: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self { model: model.into(), parts, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
