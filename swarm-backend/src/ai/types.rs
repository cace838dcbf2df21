use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Parsed arguments. When the model emits arguments that are not valid
    /// JSON the raw text is kept as a `Value::String`.
    pub arguments: Value,
}

/// Response from the reasoning capability: direct text, tool calls, or both
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl AiResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        let name = name.into();
        Self {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: format!("call_{}", name),
                name,
                arguments,
            }],
        }
    }

    pub fn first_tool_call(&self) -> Option<&ToolCall> {
        self.tool_calls.first()
    }
}
