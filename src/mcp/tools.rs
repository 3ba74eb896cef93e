use serde_json::json;

use super::protocol::Tool;

pub(crate) const READ_FILE: &str = "read_file";
pub(crate) const RECURSIVE_FILE_LIST: &str = "recursive_file_list";
pub(crate) const CALL_LLM: &str = "call_llm";

/// Return all MCP tool definitions, in listing order
pub(crate) fn tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: READ_FILE,
            description: "Read the content of a file",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" }
                },
                "required": ["path"]
            }),
        },
        Tool {
            name: RECURSIVE_FILE_LIST,
            description: "List files recursively in a directory",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" }
                },
                "required": ["path"]
            }),
        },
        Tool {
            name: CALL_LLM,
            description: "Call x.ai Grok API for chat completion",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string" },
                    "model": { "type": "string", "default": "grok-4" },
                    "max_tokens": { "type": "number", "default": 512 }
                },
                "required": ["prompt"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_definition_order() {
        let names: Vec<_> = tool_definitions().iter().map(|t| t.name).collect();
        assert_eq!(names, vec![READ_FILE, RECURSIVE_FILE_LIST, CALL_LLM]);
    }

    #[test]
    fn test_names_unique() {
        let tools = tool_definitions();
        let names: HashSet<_> = tools.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_schema_serializes_camel_case() {
        let value = serde_json::to_value(&tool_definitions()[2]).unwrap();
        assert_eq!(value["inputSchema"]["required"], json!(["prompt"]));
        assert_eq!(value["inputSchema"]["properties"]["max_tokens"]["default"], json!(512));
    }
}
