//! Script generation through an OpenAI-compatible chat-completions endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ScriptConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Text generation service
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Produce a short spoken-style script about `prompt` in the given tone.
    async fn generate(&self, prompt: &str, tone: &str, language: &str) -> Result<String>;
}

const PROVIDER: &str = "openai";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat-completions client
pub struct OpenAiScriptClient {
    client: Client,
    api_key: String,
    config: ScriptConfig,
    retry: RetryPolicy,
}

impl OpenAiScriptClient {
    #[must_use]
    pub fn new(client: Client, api_key: String, config: ScriptConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            api_key,
            config,
            retry,
        }
    }

    fn messages(prompt: &str, tone: &str, language: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: format!(
                    "You write scripts for short vertical videos. Write a short, punchy \
                     spoken script of fewer than 100 words with a {tone} tone, in the \
                     language with code '{language}'. Return only the words to be spoken."
                ),
            },
            ChatMessage {
                role: "user".to_string(),
                content: format!("Write a video script about the following idea: '{prompt}'."),
            },
        ]
    }

    async fn request_once(&self, prompt: &str, tone: &str, language: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: Self::messages(prompt, tone, language),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::from_transport(PROVIDER, &e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_status(PROVIDER, status, &text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::from_transport(PROVIDER, &e))?;

        extract_script(parsed)
    }
}

fn extract_script(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::EmptyResponse {
            provider: PROVIDER.to_string(),
        })
}

#[async_trait]
impl ScriptGenerator for OpenAiScriptClient {
    async fn generate(&self, prompt: &str, tone: &str, language: &str) -> Result<String> {
        debug!(model = %self.config.model, "Requesting script");
        let script = self
            .retry
            .run(PROVIDER, || self.request_once(prompt, tone, language))
            .await?;
        info!("Generated script ({} chars)", script.len());
        Ok(script)
    }
}
