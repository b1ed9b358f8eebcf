use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::TransportError;
use crate::models::{ContentPart, ImageInput, ModelRequest, ModelResponse, OutputKind, ProviderConfig};
use crate::traits::ModelTransport;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` over REST.
pub struct GeminiProvider {
    config: ProviderConfig,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::new();
        Self { config, client }
    }

    fn api_base(&self) -> &str {
        self.config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseInlineData {
    mime_type: Option<String>,
    data: String,
}

fn request_parts(parts: &[ContentPart]) -> Vec<RequestPart<'_>> {
    parts
        .iter()
        .map(|part| match part {
            ContentPart::Text(text) => RequestPart { text: Some(text), inline_data: None },
            ContentPart::Image(img) => RequestPart {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: &img.mime_type,
                    data: STANDARD.encode(&img.data),
                }),
            },
        })
        .collect()
}

fn response_parts(body: GenerateContentResponse) -> Result<ModelResponse, TransportError> {
    let mut parts = Vec::new();
    let content = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content);
    for part in content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            parts.push(ContentPart::Text(text));
        }
        if let Some(inline) = part.inline_data {
            let data = STANDARD
                .decode(inline.data.as_bytes())
                .map_err(|e| TransportError::Malformed(format!("inline image is not base64: {e}")))?;
            let mime_type = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
            parts.push(ContentPart::Image(ImageInput::new(data, mime_type)));
        }
    }
    Ok(ModelResponse { parts })
}

#[async_trait]
impl ModelTransport for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, TransportError> {
        let generation_config = match request.output {
            OutputKind::Json => json!({ "responseMimeType": "application/json" }),
            OutputKind::Image => json!({ "responseModalities": ["IMAGE"] }),
        };
        let payload = json!({
            "contents": [{ "role": "user", "parts": request_parts(&request.parts) }],
            "generationConfig": generation_config,
        });

        tracing::debug!(
            model = %request.model,
            images = request.image_count(),
            "POST {}/models/{}:generateContent", self.api_base(), request.model
        );

        let response = self.client
            .post(format!("{}/models/{}:generateContent", self.api_base(), request.model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(TransportError::Status { status: status.as_u16(), message });
        }

        let body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        response_parts(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_images_inline() {
        let parts = vec![
            ContentPart::Text("hello".into()),
            ContentPart::Image(ImageInput::new(vec![1, 2, 3], "image/jpeg")),
        ];
        let encoded = serde_json::to_value(request_parts(&parts)).unwrap();
        assert_eq!(encoded[0]["text"], "hello");
        assert!(encoded[0].get("inlineData").is_none());
        assert_eq!(encoded[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(encoded[1]["inlineData"]["data"], "AQID");
    }

    #[test]
    fn decodes_text_and_image_parts() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "{\"ok\":true}" },
                    { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
                ]}
            }]
        }))
        .unwrap();
        let response = response_parts(body).unwrap();
        assert_eq!(response.joined_text(), "{\"ok\":true}");
        let image = response.first_image().unwrap();
        assert_eq!(image.data, vec![1, 2, 3]);
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn empty_candidates_yield_empty_response() {
        let body: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response_parts(body).unwrap().parts.is_empty());
    }

    #[test]
    fn config_debug_redacts_key() {
        let provider = GeminiProvider::new(ProviderConfig::new("super-secret"));
        let rendered = format!("{:?}", provider.config);
        assert!(!rendered.contains("super-secret"));
    }
}
