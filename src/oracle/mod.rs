//! Generation oracle — the external text-generation service behind the
//! interviewer.
//!
//! The engine treats the oracle as an opaque conversational endpoint: it
//! sends the running conversation and gets back raw text. Everything
//! structured (score blocks, stage markers) is *instructed* in the prompt
//! and recovered defensively by [`crate::interview::parser`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::OracleConfig;
use crate::error::OracleError;

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the running conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters, fixed per session at creation.
///
/// The stop sequence ends generation at the final structured tag so the
/// oracle does not ramble past its own output contract. The parser tolerates
/// the truncated closing tag this produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: None,
            max_tokens: 1024,
            stop: vec!["</STAGE>".to_string()],
        }
    }
}

/// The external generation service, one blocking call per turn.
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Send the conversation so far and return the raw reply text.
    async fn converse(
        &self,
        params: &GenerationParams,
        messages: &[ChatMessage],
    ) -> Result<String, OracleError>;
}

/// Create an oracle from configuration.
pub fn create_oracle(config: &OracleConfig) -> Result<Arc<dyn GenerationOracle>, OracleError> {
    let oracle = HttpOracle::new(config)?;
    tracing::info!(model = %config.model, base_url = %config.base_url, "Using HTTP oracle");
    Ok(Arc::new(oracle))
}

// ── OpenAI-compatible HTTP oracle ───────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    top_p: f64,
    // Accepted by OpenAI-compatible servers that support it; ignored otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Deserialize)]
struct CompletionResponseBody {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Oracle client speaking the OpenAI-compatible `/chat/completions` API.
pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: secrecy::SecretString,
    model: String,
}

impl HttpOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OracleError::Unavailable {
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl GenerationOracle for HttpOracle {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn converse(
        &self,
        params: &GenerationParams,
        messages: &[ChatMessage],
    ) -> Result<String, OracleError> {
        let body = CompletionRequestBody {
            model: &self.model,
            messages,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            max_tokens: params.max_tokens,
            stop: params.stop.clone(),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable {
                reason: format!("Request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(OracleError::Unavailable {
                reason: format!("HTTP {status}: {detail}"),
            });
        }

        let parsed: CompletionResponseBody =
            response.json().await.map_err(|e| OracleError::InvalidResponse {
                reason: format!("Failed to decode completion body: {e}"),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::InvalidResponse {
                reason: "Completion contained no choices".to_string(),
            })?;

        Ok(content)
    }
}
