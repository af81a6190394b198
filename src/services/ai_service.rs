//! AI Service
//!
//! Text completion for task assistance. Requests go through a
//! [`TextCompletionProvider`]; the HTTP implementation speaks the Anthropic
//! messages API.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::Config;
use crate::error::AppResult;
use crate::logging::log_ai_completion;
use crate::services::settings_service::SettingsService;

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const MAX_PROMPT_LENGTH: usize = 4000;
pub const MAX_CONTEXT_LENGTH: usize = 4000;

/// What the assistant should do with the prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AiMode {
    #[default]
    Complete,
    Breakdown,
    Rephrase,
}

impl AiMode {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AiMode::Complete => {
                "You help people with ADHD get things done. Answer briefly and concretely. \
                 Prefer short sentences and avoid overwhelming detail."
            }
            AiMode::Breakdown => {
                "You help people with ADHD start tasks. Break the task into 3 to 7 small, \
                 concrete steps that each take under 15 minutes. Reply with a numbered list only."
            }
            AiMode::Rephrase => {
                "You help people with ADHD plan. Rewrite the task as one clear, actionable \
                 title that starts with a verb. Reply with the title only."
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiRequest {
    pub prompt: String,
    #[serde(default)]
    pub mode: AiMode,
    pub context: Option<String>,
}

impl AiRequest {
    pub fn validate(&self) -> Result<(), AiError> {
        let length = self.prompt.trim().chars().count();
        if length == 0 || self.prompt.chars().count() > MAX_PROMPT_LENGTH {
            return Err(AiError::InvalidPrompt(format!(
                "prompt must be 1-{} characters",
                MAX_PROMPT_LENGTH
            )));
        }
        if let Some(context) = &self.context {
            if context.chars().count() > MAX_CONTEXT_LENGTH {
                return Err(AiError::InvalidPrompt(format!(
                    "context must be at most {} characters",
                    MAX_CONTEXT_LENGTH
                )));
            }
        }
        Ok(())
    }

    /// The user message sent to the provider
    fn user_message(&self) -> String {
        match self.context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => format!("{}\n\nContext:\n{}", self.prompt.trim(), context),
            None => self.prompt.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiResponse {
    pub text: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Something that can turn a system prompt and a user message into text
#[async_trait]
pub trait TextCompletionProvider: Send + Sync + fmt::Debug {
    fn model(&self) -> &str;

    async fn complete(&self, system: &str, message: &str) -> Result<AiResponse, AiError>;
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    model: String,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

/// Anthropic messages API over HTTP
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl AnthropicProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            max_tokens,
        })
    }

    /// Build from configuration. `None` when no API key is set.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AiError> {
        config
            .ai_api_key
            .as_ref()
            .map(|key| {
                Self::new(
                    key.clone(),
                    config.ai_base_url.clone(),
                    config.ai_model.clone(),
                    config.ai_max_tokens,
                    Duration::from_secs(config.request_timeout),
                )
            })
            .transpose()
    }
}

#[async_trait]
impl TextCompletionProvider for AnthropicProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, message: &str) -> Result<AiResponse, AiError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: message,
            }],
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("provider returned {}", status));
            return Err(AiError::Provider(message));
        }

        let body: AnthropicResponse = response.json().await?;
        let text = body
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AiError::Provider("provider returned no text".to_string()));
        }

        Ok(AiResponse {
            text,
            model: body.model,
            input_tokens: body.usage.input_tokens,
            output_tokens: body.usage.output_tokens,
        })
    }
}

/// AI completion service
#[derive(Debug, Clone)]
pub struct AiService {
    provider: Option<Arc<dyn TextCompletionProvider>>,
    settings: SettingsService,
}

impl AiService {
    pub fn new(provider: Option<Arc<dyn TextCompletionProvider>>, settings: SettingsService) -> Self {
        Self { provider, settings }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn complete(&self, user_id: &str, request: AiRequest) -> AppResult<AiResponse> {
        request.validate()?;
        let provider = self.provider.as_ref().ok_or(AiError::NotConfigured)?;

        let settings = self.settings.get(user_id).await?;
        if !settings.ai_assist_enabled {
            return Err(AiError::Disabled.into());
        }

        let response = provider
            .complete(request.mode.system_prompt(), &request.user_message())
            .await?;

        log_ai_completion(
            user_id,
            &request.mode.to_string(),
            &response.model,
            response.output_tokens,
        );
        Ok(response)
    }
}

/// AI errors
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI assistance is not configured on this server")]
    NotConfigured,

    #[error("AI assistance is disabled in your settings")]
    Disabled,

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("AI provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),
}
