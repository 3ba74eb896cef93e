use serde_json::{Map, Value};

use crate::error::RpcError;

/// Extract a required string argument
pub(crate) fn required_str<'a>(args: &'a Map<String, Value>, field: &str) -> Result<&'a str, RpcError> {
    match args.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(RpcError::InvalidParams(format!("'{}' must be a string", field))),
        None => Err(RpcError::InvalidParams(format!("missing '{}'", field))),
    }
}

/// Extract an optional string argument; null counts as absent
pub(crate) fn optional_str<'a>(
    args: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a str>, RpcError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(RpcError::InvalidParams(format!("'{}' must be a string", field))),
    }
}

/// Extract an optional non-negative integer argument; null counts as absent
pub(crate) fn optional_u64(args: &Map<String, Value>, field: &str) -> Result<Option<u64>, RpcError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| RpcError::InvalidParams(format!("'{}' must be a non-negative integer", field))),
    }
}
