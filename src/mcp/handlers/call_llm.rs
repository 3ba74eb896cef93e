use serde_json::{Map, Value};

use crate::config::LlmConfig;
use crate::error::{ExecutionError, RpcError};
use crate::llm::XaiClient;
use crate::mcp::helpers::{optional_str, optional_u64, required_str};
use crate::mcp::protocol::text_content;

/// Looks up the API key by environment variable name
pub(crate) type CredentialSource = fn(&str) -> Option<String>;

/// Read the credential from the process environment
pub(crate) fn env_credential(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Forward a prompt to the completion API.
///
/// The credential is looked up on every call; without it no request is sent.
pub(crate) async fn handle(
    args: &Map<String, Value>,
    config: &LlmConfig,
    client: &XaiClient,
    credentials: CredentialSource,
) -> Result<Value, RpcError> {
    let prompt = required_str(args, "prompt")?;
    let model = optional_str(args, "model")?.unwrap_or(config.default_model.as_str());
    let max_tokens = optional_u64(args, "max_tokens")?.unwrap_or(config.default_max_tokens);

    let api_key = credentials(&config.api_key_env)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ExecutionError::MissingCredential(config.api_key_env.clone()))?;

    let text = client
        .complete(&api_key, prompt, model, max_tokens)
        .await
        .map_err(ExecutionError::ApiCall)?;

    Ok(text_content(text))
}
