//! Chat-completion client for the x.ai API
//!
//! One POST per call, bounded by the configured timeout and response size.

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;

/// Text returned when the completion carries no usable content
pub const NO_RESPONSE: &str = "(no response)";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request to completion endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("response body exceeded {limit} bytes")]
    TooLarge { limit: usize },
}

/// x.ai API client
pub struct XaiClient {
    client: reqwest::Client,
    endpoint: String,
    max_response_bytes: usize,
}

/// Message for the chat-completion API
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat-completion request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u64,
}

/// Chat-completion response, only the part we read
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl XaiClient {
    /// Create a client; the timeout covers connect, send and body read
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Wrap an already configured `reqwest::Client`
    pub fn with_client(client: reqwest::Client, config: &LlmConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            max_response_bytes: config.max_response_bytes,
        }
    }

    /// Send a single-message completion and return the first choice's text.
    ///
    /// Only transport failures and oversized bodies are errors. Anything that
    /// arrives but cannot be read as a completion becomes [`NO_RESPONSE`].
    pub async fn complete(
        &self,
        api_key: &str,
        prompt: &str,
        model: &str,
        max_tokens: u64,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        debug!("POST {} model={} max_tokens={}", self.endpoint, model, max_tokens);

        let mut response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Completion endpoint returned {}", status);
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_response_bytes {
                return Err(LlmError::TooLarge {
                    limit: self.max_response_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(extract_content(&body))
    }
}

/// Pull `choices[0].message.content` out of a response body
pub(crate) fn extract_content(body: &[u8]) -> String {
    serde_json::from_slice::<ChatResponse>(body)
        .ok()
        .and_then(|r| r.choices.into_iter().next())
        .and_then(|c| c.message.content)
        .unwrap_or_else(|| NO_RESPONSE.to_string())
}
