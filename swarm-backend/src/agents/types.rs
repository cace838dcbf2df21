use crate::ai::{Message, MessageRole};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Static catalog entry for an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique key, also the agent kind in the registration table
    pub name: String,
    pub human_readable_name: String,
    /// Shown verbatim to the ranking capability
    pub description: String,
    /// Slash-command token without the leading `/`
    pub command: String,
    /// Only available once the conversation has an uploaded file
    #[serde(default)]
    pub upload_required: bool,
}

impl AgentDescriptor {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            human_readable_name: name.replace('_', " "),
            description: description.to_string(),
            command: name.to_string(),
            upload_required: false,
        }
    }

    pub fn with_command(mut self, command: &str) -> Self {
        self.command = command.trim_start_matches('/').to_string();
        self
    }

    pub fn with_upload_required(mut self, upload_required: bool) -> Self {
        self.upload_required = upload_required;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPrompt {
    pub role: MessageRole,
    pub content: String,
}

/// An incoming chat request as seen by the delegator and the agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: ChatPrompt,
    pub conversation_id: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default, deserialize_with = "deserialize_chain_id")]
    pub chain_id: Option<u64>,
    /// Prior conversation turns, filled in by the chat controller
    #[serde(skip)]
    pub history: Vec<Message>,
}

impl ChatRequest {
    pub fn new(content: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            prompt: ChatPrompt {
                role: MessageRole::User,
                content: content.into(),
            },
            conversation_id: conversation_id.into(),
            wallet_address: None,
            chain_id: None,
            history: Vec::new(),
        }
    }

    pub fn with_wallet(mut self, wallet_address: impl Into<String>, chain_id: u64) -> Self {
        self.wallet_address = Some(wallet_address.into());
        self.chain_id = Some(chain_id);
        self
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt.content
    }

    /// Connected wallet, ignoring blank values sent by the UI
    pub fn wallet(&self) -> Option<&str> {
        self.wallet_address
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}

/// The UI sends chain ids either as numbers or as decimal strings
fn deserialize_chain_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("chain_id must be a positive integer")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid chain_id: {}", s))),
        Some(other) => Err(serde::de::Error::custom(format!("invalid chain_id: {}", other))),
    }
}

/// Failures raised inside an agent before they are folded into an `AgentResponse`
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    /// Missing or ambiguous user-supplied argument; surfaces as NeedsInfo
    #[error("{0}")]
    Validation(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("malformed call to {tool}: {reason}")]
    MalformedToolCall { tool: String, reason: String },

    #[error("reasoning capability failed: {0}")]
    Reasoning(String),

    #[error("tool failed: {0}")]
    Tool(String),

    #[error("{0}")]
    Internal(String),
}

impl AgentError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AgentError::Validation(_))
    }
}
