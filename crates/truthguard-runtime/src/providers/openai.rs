//! OpenAI-compatible chat-completion provider.
//!
//! Groq and OpenAI expose the same `/chat/completions` contract, including
//! `response_format: {"type": "json_object"}`, so one implementation serves
//! both. The factory decides the default endpoint and credential variable.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

use super::{
    factory::ProviderFactory,
    secrets::{ApiCredential, CredentialSource},
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};

/// Environment variable name for the Groq API key.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Environment variable name for the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completion provider for any OpenAI-compatible endpoint.
pub struct OpenAiCompatibleProvider {
    name: &'static str,
    credential: ApiCredential,
    base_url: String,
    client: Client,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("name", &self.name)
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiCompatibleProvider {
    /// Create a provider with an already-loaded credential.
    pub fn new(
        name: &'static str,
        credential: ApiCredential,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        Ok(Self {
            name,
            credential,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a Groq provider with a programmatic key.
    pub fn groq(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(
            "groq",
            ApiCredential::new(api_key, CredentialSource::Programmatic, "Groq API key"),
            GROQ_BASE_URL,
        )
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Chat completion response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<UsageResponse>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatRequest {
            model: &config.model,
            messages: &messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            response_format: config.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        // SECURITY: Only expose the credential here, at the point of use
        let response = self
            .client
            .post(self.chat_completions_url())
            .bearer_auth(self.credential.expose())
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthError);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("No choices in response".to_string()))?;

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            model: body.model.unwrap_or_else(|| config.model.clone()),
            finish_reason: choice.finish_reason,
        })
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Factory for OpenAI-compatible providers.
///
/// ## Configuration Format
/// ```json
/// {
///   "api_key": "gsk_...",                 // Optional, falls back to the env variable
///   "base_url": "https://..."             // Optional, custom API endpoint
/// }
/// ```
pub struct OpenAiCompatibleFactory {
    provider_type: &'static str,
    default_base_url: &'static str,
    env_var: &'static str,
    credential_name: &'static str,
    description: &'static str,
}

impl OpenAiCompatibleFactory {
    pub fn groq() -> Self {
        Self {
            provider_type: "groq",
            default_base_url: GROQ_BASE_URL,
            env_var: GROQ_API_KEY_ENV,
            credential_name: "Groq API key",
            description: "Groq hosted models via the OpenAI-compatible API",
        }
    }

    pub fn openai() -> Self {
        Self {
            provider_type: "openai",
            default_base_url: OPENAI_BASE_URL,
            env_var: OPENAI_API_KEY_ENV,
            credential_name: "OpenAI API key",
            description: "OpenAI chat completions",
        }
    }
}

impl ProviderFactory for OpenAiCompatibleFactory {
    fn provider_type(&self) -> &'static str {
        self.provider_type
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let credential = ApiCredential::from_config_or_env(
            config,
            "api_key",
            self.env_var,
            self.credential_name,
        )?;
        let base_url = config["base_url"]
            .as_str()
            .unwrap_or(self.default_base_url);

        let provider = OpenAiCompatibleProvider::new(self.provider_type, credential, base_url)?;
        Ok(Arc::new(provider))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if !ApiCredential::is_available(config, "api_key", self.env_var) {
            return Err(ProviderError::NotConfigured(format!(
                "{} required: set 'api_key' in config or {} env",
                self.credential_name, self.env_var
            )));
        }

        if let Some(url) = config["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn description(&self) -> &'static str {
        self.description
    }
}
