use async_trait::async_trait;
use flickbook_core::assistant::{Assistant, AssistantError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::AssistantConfig;

/// Client for a local Ollama server's `/api/generate` endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AssistantError::Request(e.to_string()))?;

        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Assistant for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AssistantError::Request(e.to_string()))?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Request(e.to_string()))?;

        let text = generated.response.trim();
        if text.is_empty() {
            return Err(AssistantError::Empty);
        }
        Ok(text.to_string())
    }
}
