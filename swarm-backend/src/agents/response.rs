//! The uniform result every agent produces
//!
//! An `AgentResponse` is built once through one of the four factories and is
//! not mutated afterwards, apart from attaching metadata while it is being
//! constructed. The delegator keys its fallback decision on `response_type`:
//! only `Error` moves on to the next ranked agent.

use crate::ai::MessageRole;
use crate::models::ChatMessage;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User-facing preamble for error responses; the error text is appended at
/// transport conversion time.
pub const ERROR_PREAMBLE: &str =
    "An unexpected error occurred while processing your request. The error message is:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Success,
    NeedsInfo,
    Error,
    ActionRequired,
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseType::Success => write!(f, "success"),
            ResponseType::NeedsInfo => write!(f, "needs_info"),
            ResponseType::Error => write!(f, "error"),
            ResponseType::ActionRequired => write!(f, "action_required"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    response_type: ResponseType,
    content: String,
    error_message: Option<String>,
    metadata: Map<String, Value>,
    requires_action: bool,
    action_type: Option<String>,
}

impl AgentResponse {
    fn build(response_type: ResponseType, content: String) -> Self {
        Self {
            response_type,
            content,
            error_message: None,
            metadata: Map::new(),
            requires_action: false,
            action_type: None,
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::build(ResponseType::Success, content.into())
    }

    pub fn error(error_message: impl Into<String>) -> Self {
        let mut response = Self::build(ResponseType::Error, ERROR_PREAMBLE.to_string());
        response.error_message = Some(error_message.into());
        response
    }

    pub fn needs_info(content: impl Into<String>) -> Self {
        Self::build(ResponseType::NeedsInfo, content.into())
    }

    pub fn action_required(content: impl Into<String>, action_type: impl Into<String>) -> Self {
        let mut response = Self::build(ResponseType::ActionRequired, content.into());
        response.requires_action = true;
        response.action_type = Some(action_type.into());
        response
    }

    /// Attach a metadata entry; a repeated key replaces the earlier value
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn requires_action(&self) -> bool {
        self.requires_action
    }

    pub fn action_type(&self) -> Option<&str> {
        self.action_type.as_deref()
    }

    /// Check the variant invariants: `error_message` iff Error,
    /// `requires_action` and `action_type` iff ActionRequired.
    pub fn validate(&self) -> Result<(), String> {
        let is_error = self.response_type == ResponseType::Error;
        let is_action = self.response_type == ResponseType::ActionRequired;

        if is_error != self.error_message.is_some() {
            return Err(format!(
                "{} response with error_message={:?}",
                self.response_type, self.error_message
            ));
        }
        if is_action != self.requires_action {
            return Err(format!(
                "{} response with requires_action={}",
                self.response_type, self.requires_action
            ));
        }
        match (&self.action_type, is_action) {
            (Some(a), true) if !a.trim().is_empty() => Ok(()),
            (None, false) => Ok(()),
            (action_type, _) => Err(format!(
                "{} response with action_type={:?}",
                self.response_type, action_type
            )),
        }
    }

    /// Convert to a transport message attributed to `agent_name`
    pub fn to_chat_message(&self, agent_name: Option<&str>) -> ChatMessage {
        let content = match self.error_message {
            Some(ref err) => format!("{} {}", self.content, err),
            None => self.content.clone(),
        };

        ChatMessage {
            role: MessageRole::Assistant,
            content,
            agent_name: agent_name.map(str::to_string),
            error_message: self.error_message.clone(),
            metadata: self.metadata.clone(),
            requires_action: self.requires_action,
            action_type: self.action_type.clone(),
            timestamp: Utc::now(),
        }
    }

    #[cfg(test)]
    pub(crate) fn malformed_for_test() -> Self {
        let mut response = Self::build(ResponseType::ActionRequired, "swap ready".to_string());
        response.requires_action = true;
        response
    }
}
