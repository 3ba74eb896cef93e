use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RpcError;

/// JSON-RPC 2.0 Request, validated
#[derive(Debug, Clone)]
pub(crate) struct JsonRpcRequest {
    pub id: Value,
    pub method: String,
    pub params: Map<String, Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub payload: Payload,
}

/// Exactly one of `result` or `error`
#[derive(Debug, Serialize)]
pub(crate) enum Payload {
    #[serde(rename = "result")]
    Result(Value),
    #[serde(rename = "error")]
    Error(JsonRpcError),
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// MCP Tool definition
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A message that could not become a request, with whatever id was recovered
#[derive(Debug)]
pub(crate) struct Rejected {
    pub id: Value,
    pub error: RpcError,
}

/// Decode one inbound message.
///
/// The id is recovered first so envelope errors still echo it; a message that
/// is not JSON at all answers with id 0.
pub(crate) fn parse_request(raw: &[u8]) -> Result<JsonRpcRequest, Rejected> {
    let value: Value = serde_json::from_slice(raw.trim_ascii()).map_err(|e| Rejected {
        id: default_id(),
        error: RpcError::Parse(e),
    })?;

    let Value::Object(mut envelope) = value else {
        return Err(Rejected {
            id: default_id(),
            error: RpcError::InvalidRequest("request must be an object".to_string()),
        });
    };

    let id = match envelope.remove("id") {
        None | Some(Value::Null) => default_id(),
        Some(id @ Value::String(_)) => id,
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Value::Number(n),
        Some(_) => {
            return Err(Rejected {
                id: default_id(),
                error: RpcError::InvalidRequest("id must be an integer".to_string()),
            });
        }
    };

    let method = match envelope.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => {
            return Err(Rejected {
                id,
                error: RpcError::InvalidRequest("method must be a string".to_string()),
            });
        }
        None => {
            return Err(Rejected {
                id,
                error: RpcError::InvalidRequest("missing method".to_string()),
            });
        }
    };

    let params = match envelope.remove("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params,
        Some(_) => {
            return Err(Rejected {
                id,
                error: RpcError::InvalidRequest("params must be an object".to_string()),
            });
        }
    };

    Ok(JsonRpcRequest { id, method, params })
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            payload: Payload::Result(result),
        }
    }

    pub fn failure(id: Value, error: &RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            payload: Payload::Error(JsonRpcError {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }

    /// Serialize as a single line, terminated by `\n`
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Wrap tool output in the `{content: [{type: "text", text}]}` envelope
pub(crate) fn text_content(text: impl Into<String>) -> Value {
    serde_json::json!({
        "content": [{
            "type": "text",
            "text": text.into()
        }]
    })
}

fn default_id() -> Value {
    Value::from(0)
}
