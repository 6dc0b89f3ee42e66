//! OpenAI-compatible chat-completions client for sketch analysis.

use crate::analysis::{AnalysisError, VisionAnalyzer};
use crate::config::ServerConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sketchlens_core::raster::PNG_MIME;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Vision analyzer backed by a chat-completions endpoint.
pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiAnalyzer {
    /// Build an analyzer from the server configuration. `None` without a key.
    pub fn from_config(config: &ServerConfig) -> Result<Option<Self>, AnalysisError> {
        let Some(api_key) = config.openai_api_key.clone() else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .user_agent(concat!("sketchlens/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AnalysisError::Remote(format!("HTTP client error: {e}")))?;
        Ok(Some(Self {
            client,
            endpoint: config.openai_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }))
    }

    fn request<'a>(&'a self, prompt: &'a str, image_base64: &str, temperature: f32) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{PNG_MIME};base64,{image_base64}"),
                        },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiAnalyzer {
    async fn analyze(
        &self,
        prompt: &str,
        image_base64: &str,
        temperature: f32,
    ) -> Result<String, AnalysisError> {
        let body = self.request(prompt, image_base64, temperature);
        debug!(model = %self.model, endpoint = %self.endpoint, "requesting sketch analysis");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Remote(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::Remote(e.to_string()))?;
        if !status.is_success() {
            return Err(AnalysisError::Remote(remote_error_message(status, &text)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::Remote(format!("unexpected response: {e}")))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// The service's own error message when it sent one, else status and body.
fn remote_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("{status}: {}", body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analyzer() -> OpenAiAnalyzer {
        let config = ServerConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..ServerConfig::default()
        };
        OpenAiAnalyzer::from_config(&config).unwrap().unwrap()
    }

    #[test]
    fn test_no_key_no_analyzer() {
        assert!(OpenAiAnalyzer::from_config(&ServerConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let analyzer = analyzer();
        let body = serde_json::to_value(analyzer.request("Describe it.", "QUJD", 0.5)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "max_tokens": 800,
                "temperature": 0.5,
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "Describe it."},
                        {"type": "image_url", "image_url": {"url": "data:image/png;base64,QUJD"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "hola"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hola"));

        let empty: ChatResponse = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(empty.choices.is_empty());
    }

    #[test]
    fn test_remote_error_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            remote_error_message(reqwest::StatusCode::UNAUTHORIZED, body),
            "Incorrect API key provided"
        );
        assert_eq!(
            remote_error_message(reqwest::StatusCode::BAD_GATEWAY, "upstream down\n"),
            "502 Bad Gateway: upstream down"
        );
    }
}
