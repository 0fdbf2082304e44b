use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant request failed: {0}")]
    Request(String),
    #[error("assistant returned no text")]
    Empty,
}

/// Local conversational model used by the movie chat.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError>;
}
