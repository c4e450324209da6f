//! Language-model backends.
//!
//! The orchestrator only ever sees [`LanguageModel`]: one prompt in, one completion string out.
//! Prompt assembly and response parsing live elsewhere so every backend stays a thin HTTP shim.

mod mock;
mod ollama;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub use mock::MockLanguageModel;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// One completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Overrides the backend's configured temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Ask the backend for JSON-only output where it supports that.
    pub json: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: None,
            json: true,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Abstraction over a completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short label used in logs, e.g. `ollama:codellama:7b`.
    fn name(&self) -> String;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;

    /// Whether the backend is reachable.
    ///
    /// Backends without a cheap probe report healthy and let the first real request fail.
    async fn health_check(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    Ollama,
    #[serde(alias = "open_ai", alias = "openai-compatible")]
    OpenAi,
}

/// Backend selection and sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "codellama:7b".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: 120,
        }
    }
}

impl ModelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Build the configured backend.
pub fn build_model(settings: &ModelSettings) -> Result<Arc<dyn LanguageModel>, ModelError> {
    match settings.provider {
        ModelProvider::Ollama => Ok(Arc::new(OllamaClient::new(settings)?)),
        ModelProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(settings)?)),
    }
}
