use thiserror::Error;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const APPLICATION_ERROR: i32 = -32000;

/// Protocol-level failures, surfaced to the caller with the standard JSON-RPC codes
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Parse error")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Tool execution failures. Display is the only text the caller ever sees
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("File not found")]
    FileNotFound(#[source] std::io::Error),

    #[error("Access denied")]
    AccessDenied,

    #[error("{0} not set")]
    MissingCredential(String),

    #[error("API call failed")]
    ApiCall(#[source] crate::llm::LlmError),
}

impl RpcError {
    pub fn code(&self) -> i32 {
        match self {
            RpcError::Parse(_) => PARSE_ERROR,
            RpcError::InvalidRequest(_) => INVALID_REQUEST,
            RpcError::MethodNotFound(_) | RpcError::ToolNotFound(_) => METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            RpcError::Execution(_) => APPLICATION_ERROR,
        }
    }
}
