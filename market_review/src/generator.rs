use async_trait::async_trait;
use log::{debug, warn};
use market_data::config::GenerationSettings;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::GenerationFailure;

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Outcome of one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Generated(String),
    Failed(GenerationFailure),
}

impl Generation {
    /// The generated text, or `fallback` when nothing usable came back.
    pub fn or_fallback(self, section: &str, fallback: &str) -> String {
        match self {
            Self::Generated(text) if !text.trim().is_empty() => text,
            Self::Generated(_) => {
                warn!("{}: generator returned blank text, using fallback", section);
                fallback.to_string()
            }
            Self::Failed(reason) => {
                warn!("{}: using fallback text ({})", section, reason);
                fallback.to_string()
            }
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Generation;

    fn provider(&self) -> &str;
}

/// Stands in when no API key is configured.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &Prompt) -> Generation {
        Generation::Failed(GenerationFailure::Disabled)
    }

    fn provider(&self) -> &str {
        "disabled"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client. One attempt per prompt.
pub struct ChatCompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionClient {
    pub fn new(client: Client, api_key: String, settings: &GenerationSettings) -> Self {
        Self {
            client,
            api_key,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn generate(&self, prompt: &Prompt) -> Generation {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = match self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Generation::Failed(GenerationFailure::Transport(e.to_string())),
        };

        match response.status() {
            status if status.is_success() => {}
            StatusCode::TOO_MANY_REQUESTS => {
                return Generation::Failed(GenerationFailure::RateLimited);
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Generation::Failed(GenerationFailure::Unauthorized);
            }
            status => return Generation::Failed(GenerationFailure::Status(status.as_u16())),
        }

        let body: ChatResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return Generation::Failed(GenerationFailure::Malformed(e.to_string())),
        };

        match body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
        {
            Some(text) if !text.is_empty() => {
                debug!("Generated {} characters", text.len());
                Generation::Generated(text)
            }
            _ => Generation::Failed(GenerationFailure::Empty),
        }
    }

    fn provider(&self) -> &str {
        "openai"
    }
}
