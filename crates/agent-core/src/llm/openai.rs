use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CompletionRequest, LanguageModel, ModelSettings};
use crate::errors::ModelError;

/// Client for OpenAI and OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(settings: &ModelSettings) -> Result<Self, ModelError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty());
        let api_base = settings.base_url.trim_end_matches('/').to_string();
        if api_key.is_none() && api_base.contains("api.openai.com") {
            return Err(ModelError::configuration("missing OpenAI API key"));
        }
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|err| {
                ModelError::configuration(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            api_base,
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: self.max_tokens,
            response_format: request.json.then_some(ResponseFormat {
                r#type: "json_object",
            }),
            messages,
        };
        debug!(model = %self.model, prompt_chars = request.prompt.len(), "Sending chat completion");

        let url = format!("{}/chat/completions", self.api_base);
        let response = self.authorized(self.client.post(&url)).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            let body = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            warn!(status, message = %body, "Chat completion rejected");
            return Err(ModelError::Status { status, body });
        }

        let response: ChatCompletionResponse = response.json().await?;
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .and_then(ChatCompletionContent::as_text)
            .ok_or_else(|| ModelError::invalid_response("chat completion missing content"))
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.api_base);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "Chat endpoint health check failed");
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<ChatCompletionContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        let text = match self {
            ChatCompletionContent::Text(value) => value.clone(),
            ChatCompletionContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        };
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_openai_requires_a_key() {
        let result = OpenAiClient::new(&ModelSettings {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            ..ModelSettings::default()
        });
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn compatible_servers_may_run_without_a_key() {
        let client = OpenAiClient::new(&ModelSettings {
            base_url: "http://localhost:8080/v1/".into(),
            api_key: Some("  ".into()),
            ..ModelSettings::default()
        })
        .expect("client");
        assert!(client.api_key.is_none());
        assert_eq!(client.api_base, "http://localhost:8080/v1");
    }

    #[test]
    fn content_parts_are_joined() {
        let raw = r#"{"choices":[{"message":{"content":[{"type":"text","text":"{\"a\":"},{"type":"text","text":"1}"}]}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(raw).expect("parse");
        let text = response.choices[0]
            .message
            .content
            .as_ref()
            .and_then(ChatCompletionContent::as_text)
            .expect("text");
        assert_eq!(text, "{\"a\":\n1}");
    }
}
