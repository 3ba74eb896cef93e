use serde_json::{Map, Value};
use std::fs::File;
use std::io::Read;

use crate::error::{ExecutionError, RpcError};
use crate::mcp::helpers::required_str;
use crate::mcp::protocol::text_content;
use crate::sandbox::{Sandbox, SandboxError};

/// Read up to `max_bytes` of a sandboxed file. Anything past the cap is left unread
pub(crate) fn handle(
    args: &Map<String, Value>,
    sandbox: &Sandbox,
    max_bytes: usize,
) -> Result<Value, RpcError> {
    let path = required_str(args, "path")?;

    let resolved = sandbox.resolve(path).map_err(|e| match e {
        SandboxError::NotFound(io) => ExecutionError::FileNotFound(io),
        SandboxError::Escapes => ExecutionError::AccessDenied,
    })?;

    let file = File::open(&resolved.absolute).map_err(ExecutionError::FileNotFound)?;
    let mut content = Vec::new();
    file.take(max_bytes as u64)
        .read_to_end(&mut content)
        .map_err(ExecutionError::FileNotFound)?;

    Ok(text_content(String::from_utf8_lossy(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SandboxConfig;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (Sandbox, TempDir) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("greeting.txt"), "hello").unwrap();
        let sandbox = Sandbox::new(&SandboxConfig {
            root: temp.path().to_path_buf(),
            ..SandboxConfig::default()
        });
        (sandbox, temp)
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reads_file() {
        let (sandbox, _temp) = setup();
        let result = handle(&args(json!({"path": "greeting.txt"})), &sandbox, 8191).unwrap();
        assert_eq!(result, json!({"content": [{"type": "text", "text": "hello"}]}));
    }

    #[test]
    fn test_truncates_at_cap() {
        let (sandbox, _temp) = setup();
        let result = handle(&args(json!({"path": "greeting.txt"})), &sandbox, 3).unwrap();
        assert_eq!(result["content"][0]["text"], json!("hel"));
    }

    #[test]
    fn test_missing_file() {
        let (sandbox, _temp) = setup();
        let err = handle(&args(json!({"path": "missing.txt"})), &sandbox, 8191).unwrap_err();
        assert_eq!(err.code(), -32000);
        assert_eq!(err.to_string(), "File not found");
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let (sandbox, temp) = setup();
        std::fs::create_dir(temp.path().join("dir")).unwrap();
        let err = handle(&args(json!({"path": "dir"})), &sandbox, 8191).unwrap_err();
        assert_eq!(err.to_string(), "File not found");
    }

    #[test]
    fn test_traversal_denied() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(temp.path().join("secret.txt"), "s3cret").unwrap();
        let sandbox = Sandbox::new(&SandboxConfig {
            root,
            ..SandboxConfig::default()
        });

        let err = handle(&args(json!({"path": "../secret.txt"})), &sandbox, 8191).unwrap_err();
        assert_eq!(err.code(), -32000);
        assert_eq!(err.to_string(), "Access denied");
    }

    #[test]
    fn test_path_required() {
        let (sandbox, _temp) = setup();
        assert_eq!(handle(&args(json!({})), &sandbox, 8191).unwrap_err().code(), -32602);
        assert_eq!(
            handle(&args(json!({"path": 3})), &sandbox, 8191).unwrap_err().code(),
            -32602
        );
    }
}
