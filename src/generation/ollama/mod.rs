#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AnswerGenerator, build_prompt};
use crate::config::OllamaConfig;
use crate::ollama::OllamaClient;

/// Answer generator backed by the Ollama `/api/chat` endpoint
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

impl OllamaGenerator {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = OllamaClient::new(config).context("Failed to initialize Ollama client")?;
        Ok(Self::with_client(client, config))
    }

    #[inline]
    pub fn with_client(client: OllamaClient, config: &OllamaConfig) -> Self {
        Self {
            client,
            model: config.generation_model.clone(),
            temperature: config.temperature,
        }
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl AnswerGenerator for OllamaGenerator {
    fn generate(&self, question: &str, contexts: &[String]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(question, contexts),
            }],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        debug!(
            "Generating answer with {} from {} passages",
            self.model,
            contexts.len()
        );

        let response: ChatResponse = self
            .client
            .post_json("/api/chat", &request)
            .context("Failed to generate answer")?;

        Ok(response.message.content.trim().to_string())
    }
}
