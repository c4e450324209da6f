use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CompletionRequest, LanguageModel, ModelSettings};
use crate::errors::ModelError;

/// Client for a local Ollama server (`/api/generate`).
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaClient {
    pub fn new(settings: &ModelSettings) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|err| {
                ModelError::configuration(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    /// Names of the models the server has pulled.
    pub async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|entry| entry.name).collect())
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn name(&self) -> String {
        format!("ollama:{}", self.model)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
            format: request.json.then_some("json"),
            options: GenerateOptions {
                temperature: request.temperature.unwrap_or(self.temperature),
                num_predict: self.max_tokens,
            },
        };
        debug!(model = %self.model, prompt_chars = request.prompt.len(), "Sending generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            warn!(status, "Ollama rejected generate request");
            return Err(ModelError::Status { status, body });
        }

        let payload: GenerateResponse = response.json().await?;
        if payload.response.trim().is_empty() {
            return Err(ModelError::invalid_response("ollama returned an empty response"));
        }
        Ok(payload.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "Ollama health check failed");
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}
