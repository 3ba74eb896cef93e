use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ExecutionError, RpcError};
use crate::mcp::helpers::required_str;
use crate::mcp::protocol::text_content;
use crate::sandbox::{Sandbox, SandboxError};

/// List every path below a sandboxed directory as a JSON array.
/// A missing directory lists as `[]`
pub(crate) fn handle(args: &Map<String, Value>, sandbox: &Sandbox) -> Result<Value, RpcError> {
    let path = required_str(args, "path")?;

    let paths = match sandbox.resolve(path) {
        Ok(start) => {
            let listing = sandbox.walk(&start);
            if listing.truncated {
                debug!("Returning partial listing of {} ({} paths)", path, listing.paths.len());
            }
            listing.paths
        }
        Err(SandboxError::NotFound(e)) => {
            debug!("Nothing to list at {}: {}", path, e);
            Vec::new()
        }
        Err(SandboxError::Escapes) => return Err(ExecutionError::AccessDenied.into()),
    };

    Ok(text_content(Value::from(paths).to_string()))
}
