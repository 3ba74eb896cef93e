pub(crate) mod handlers;
pub(crate) mod helpers;
pub(crate) mod protocol;
pub(crate) mod tools;

use anyhow::{Context, Result};
use protocol::{JsonRpcRequest, JsonRpcResponse, Tool};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::config::{Config, LlmConfig};
use crate::error::RpcError;
use crate::llm::XaiClient;
use crate::sandbox::Sandbox;
use handlers::call_llm::{CredentialSource, env_credential};

/// MCP Server implementation
pub(crate) struct McpServer {
    tools: Vec<Tool>,
    sandbox: Sandbox,
    max_file_bytes: usize,
    llm_config: LlmConfig,
    llm: XaiClient,
    credentials: CredentialSource,
}

impl McpServer {
    pub fn new(config: &Config) -> Result<Self> {
        let llm = XaiClient::new(&config.llm).context("Failed to build HTTP client")?;
        Ok(Self::with_llm_client(config, llm))
    }

    pub fn with_llm_client(config: &Config, llm: XaiClient) -> Self {
        Self {
            tools: tools::tool_definitions(),
            sandbox: Sandbox::new(&config.sandbox),
            max_file_bytes: config.sandbox.max_file_bytes,
            llm_config: config.llm.clone(),
            llm,
            credentials: env_credential,
        }
    }

    /// Replace where `call_llm` reads its API key from
    #[cfg(test)]
    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Parse one raw message and answer it
    pub async fn handle_message(&self, raw: &[u8]) -> JsonRpcResponse {
        match protocol::parse_request(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(rejected) => {
                warn!("Rejected message (code {}): {}", rejected.error.code(), rejected.error);
                JsonRpcResponse::failure(rejected.id, &rejected.error)
            }
        }
    }

    /// Handle incoming JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Dispatching {} (id {})", request.method, request.id);

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "tools/list" => Ok(json!(self.tools)),
            "tools/call" => self.handle_tools_call(&request.params).await,
            _ => Err(RpcError::MethodNotFound(request.method.clone())),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => {
                match std::error::Error::source(&error) {
                    Some(cause) => warn!("{} failed: {} ({})", request.method, error, cause),
                    None => warn!("{} failed: {}", request.method, error),
                }
                JsonRpcResponse::failure(request.id, &error)
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {
                    "listChanged": true
                }
            },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    /// Handle tools/call request; names outside the registry are ToolNotFound
    async fn handle_tools_call(&self, params: &Map<String, Value>) -> Result<Value, RpcError> {
        let name = helpers::required_str(params, "name")?;
        let arguments = match params.get("arguments") {
            Some(Value::Object(arguments)) => arguments,
            Some(_) => return Err(RpcError::InvalidParams("'arguments' must be an object".to_string())),
            None => return Err(RpcError::InvalidParams("missing 'arguments'".to_string())),
        };

        match name {
            tools::READ_FILE => handlers::read_file::handle(arguments, &self.sandbox, self.max_file_bytes),
            tools::RECURSIVE_FILE_LIST => handlers::file_list::handle(arguments, &self.sandbox),
            tools::CALL_LLM => {
                handlers::call_llm::handle(arguments, &self.llm_config, &self.llm, self.credentials).await
            }
            _ => Err(RpcError::ToolNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SandboxConfig;
    use crate::llm::tests::local_client;
    use tempfile::TempDir;

    fn create_test_server() -> (McpServer, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("greeting.txt"), "hello").unwrap();
        std::fs::create_dir_all(temp_dir.path().join("tree/sub")).unwrap();
        std::fs::write(temp_dir.path().join("tree/a.txt"), "a").unwrap();
        std::fs::write(temp_dir.path().join("tree/sub/b.txt"), "b").unwrap();

        let mut config = Config {
            sandbox: SandboxConfig {
                root: temp_dir.path().to_path_buf(),
                ..SandboxConfig::default()
            },
            ..Config::default()
        };
        config.llm.endpoint = "http://127.0.0.1:9/".to_string();

        let llm = local_client(&config.llm);
        let server = McpServer::with_llm_client(&config, llm).with_credentials(|_| None);
        (server, temp_dir)
    }

    async fn send(server: &McpServer, raw: &str) -> Value {
        serde_json::to_value(server.handle_message(raw.as_bytes()).await).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let (server, _temp) = create_test_server();
        let response = send(&server, r#"{"jsonrpc":"2.0","id":41,"method":"initialize"}"#).await;

        assert_eq!(response["id"], json!(41));
        assert_eq!(response["jsonrpc"], json!("2.0"));
        assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], json!(true));
        assert!(response.get("error").is_none());
    }

    #[tokio::test]
    async fn test_tools_list_ignores_params() {
        let (server, _temp) = create_test_server();

        for raw in [
            r#"{"id":1,"method":"tools/list"}"#,
            r#"{"id":1,"method":"tools/list","params":{"cursor":"x"}}"#,
        ] {
            let response = send(&server, raw).await;
            let names: Vec<_> = response["result"]
                .as_array()
                .unwrap()
                .iter()
                .map(|t| t["name"].as_str().unwrap().to_string())
                .collect();
            assert_eq!(names, vec!["read_file", "recursive_file_list", "call_llm"]);
        }
    }

    #[tokio::test]
    async fn test_read_file_call() {
        let (server, _temp) = create_test_server();
        let response = send(
            &server,
            r#"{"id":5,"method":"tools/call","params":{"name":"read_file","arguments":{"path":"greeting.txt"}}}"#,
        )
        .await;
        assert_eq!(response["id"], json!(5));
        assert_eq!(response["result"]["content"][0]["text"], json!("hello"));

        let response = send(
            &server,
            r#"{"id":6,"method":"tools/call","params":{"name":"read_file","arguments":{"path":"missing.txt"}}}"#,
        )
        .await;
        assert_eq!(response["id"], json!(6));
        assert_eq!(response["error"]["code"], json!(-32000));
        assert_eq!(response["error"]["message"], json!("File not found"));
    }

    #[tokio::test]
    async fn test_recursive_file_list_call() {
        let (server, _temp) = create_test_server();
        let response = send(
            &server,
            r#"{"id":8,"method":"tools/call","params":{"name":"recursive_file_list","arguments":{"path":"tree"}}}"#,
        )
        .await;

        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let paths: Vec<String> = serde_json::from_str(text).unwrap();
        for expected in ["tree/a.txt", "tree/sub", "tree/sub/b.txt"] {
            assert!(paths.iter().any(|p| p == expected), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_call_llm_without_credential() {
        let (server, _temp) = create_test_server();

        let response = send(
            &server,
            r#"{"id":9,"method":"tools/call","params":{"name":"call_llm","arguments":{"prompt":"hi"}}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], json!(-32000));
        assert_eq!(
            response["error"]["message"],
            json!("XAI_API_KEY not set")
        );
    }

    #[tokio::test]
    async fn test_tools_call_param_errors() {
        let (server, _temp) = create_test_server();

        let cases = [
            (r#"{"id":1,"method":"tools/call"}"#, -32602),
            (r#"{"id":1,"method":"tools/call","params":{"name":"read_file"}}"#, -32602),
            (r#"{"id":1,"method":"tools/call","params":{"arguments":{}}}"#, -32602),
            (r#"{"id":1,"method":"tools/call","params":{"name":7,"arguments":{}}}"#, -32602),
            (r#"{"id":1,"method":"tools/call","params":{"name":"read_file","arguments":"x"}}"#, -32602),
            (r#"{"id":1,"method":"tools/call","params":{"name":"rm_rf","arguments":{}}}"#, -32601),
        ];
        for (raw, code) in cases {
            let response = send(&server, raw).await;
            assert_eq!(response["error"]["code"], json!(code), "{}", raw);
            assert!(response.get("result").is_none());
        }
    }

    #[tokio::test]
    async fn test_every_registered_tool_dispatches() {
        let (server, _temp) = create_test_server();

        for tool in server.tools() {
            let raw = json!({
                "id": 1,
                "method": "tools/call",
                "params": {"name": tool.name, "arguments": {}}
            })
            .to_string();
            let response = send(&server, &raw).await;
            // empty arguments reach the tool and fail its own validation
            assert_eq!(response["error"]["code"], json!(-32602), "{}", tool.name);
        }
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (server, _temp) = create_test_server();
        let response = send(&server, r#"{"id":"abc","method":"resources/list"}"#).await;
        assert_eq!(response["id"], json!("abc"));
        assert_eq!(response["error"]["code"], json!(-32601));
    }

    #[tokio::test]
    async fn test_parse_error_ignores_embedded_method() {
        let (server, _temp) = create_test_server();
        let response = send(&server, r#"{"id":4,"method":"initialize"#).await;
        assert_eq!(response["error"]["code"], json!(-32700));
        assert_eq!(response["id"], json!(0));

        let response = send(&server, "{").await;
        assert_eq!(response["error"]["code"], json!(-32700));
    }

    #[tokio::test]
    async fn test_id_echoed_byte_for_byte() {
        let (server, _temp) = create_test_server();

        for (raw, id) in [
            (r#"{"id":-17,"method":"initialize"}"#, r#""id":-17"#),
            (r#"{"id":9007199254740993,"method":"tools/list"}"#, r#""id":9007199254740993"#),
            (r#"{"id":3,"method":"nope"}"#, r#""id":3"#),
            (r#"{"method":"initialize"}"#, r#""id":0"#),
        ] {
            let line = server.handle_message(raw.as_bytes()).await.to_line().unwrap();
            assert!(line.contains(id), "{} -> {}", raw, line);
        }
    }
}
