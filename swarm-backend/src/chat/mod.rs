//! Chat entry point
//!
//! Resolves one incoming message: an explicit `/command` pins and calls that
//! agent directly, anything else goes through a fresh `Delegator`. The user
//! message is always appended before the response.

use crate::agents::{AgentRegistry, AgentResponse, ChatRequest, RegistryError};
use crate::ai::{MessageRole, ReasoningClient};
use crate::conversation::ConversationStore;
use crate::delegation::{DelegationMetrics, Delegator};
use crate::models::ChatMessage;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("agent '{0}' is not available")]
    AgentUnavailable(String),

    #[error("agent returned a malformed response: {0}")]
    MalformedResponse(String),

    /// Nothing resolved; carries the generic message already stored in the conversation
    #[error("{}", .0.content)]
    Unresolved(ChatMessage),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

pub struct ChatController {
    registry: Arc<AgentRegistry>,
    conversations: Arc<ConversationStore>,
    reasoning: Arc<dyn ReasoningClient>,
    metrics: Arc<DelegationMetrics>,
    agent_timeout: Duration,
    request_timeout: Duration,
    history_limit: usize,
}

impl ChatController {
    pub fn new(
        registry: Arc<AgentRegistry>,
        conversations: Arc<ConversationStore>,
        reasoning: Arc<dyn ReasoningClient>,
        metrics: Arc<DelegationMetrics>,
    ) -> Self {
        Self {
            registry,
            conversations,
            reasoning,
            metrics,
            agent_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(180),
            history_limit: 20,
        }
    }

    pub fn with_timeouts(mut self, agent_timeout: Duration, request_timeout: Duration) -> Self {
        self.agent_timeout = agent_timeout;
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Handle one chat request under the outer request timeout
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatMessage, ChatError> {
        if request.conversation_id.trim().is_empty() {
            return Err(ChatError::InvalidRequest("conversation_id is required".to_string()));
        }
        if request.prompt.role != MessageRole::User {
            return Err(ChatError::InvalidRequest(format!(
                "prompt role must be 'user', got '{}'",
                request.prompt.role
            )));
        }

        match tokio::time::timeout(self.request_timeout, self.resolve(request)).await {
            Ok(result) => result,
            Err(_) => {
                log::error!("[CHAT] Request timed out after {:?}", self.request_timeout);
                Err(ChatError::Timeout(self.request_timeout))
            }
        }
    }

    async fn resolve(&self, mut request: ChatRequest) -> Result<ChatMessage, ChatError> {
        let conversation_id = request.conversation_id.clone();
        request.history = self
            .conversations
            .history_messages(&conversation_id, self.history_limit)
            .await;

        let (command, remaining) = self.registry.parse_command(request.prompt_text());

        let (resolver, response) = match command {
            Some(agent_name) => {
                self.registry.set_active_agent(&agent_name)?;
                log::info!("[CHAT] Command routed to '{}'", agent_name);

                request.prompt.content = remaining;
                self.conversations
                    .append(&conversation_id, ChatMessage::user(request.prompt_text()))
                    .await;

                let agent = self
                    .registry
                    .get_agent(&agent_name)
                    .ok_or_else(|| ChatError::AgentUnavailable(agent_name.clone()))?;
                let response = agent.chat(&request).await.unwrap_or_else(|e| {
                    log::error!("[CHAT] Agent '{}' failed: {}", agent_name, e);
                    AgentResponse::error(e.to_string())
                });
                (Some(agent_name), response)
            }
            None => {
                self.registry.clear_active_agent();

                let history = self
                    .conversations
                    .chat_history(&conversation_id, self.history_limit)
                    .await;
                let has_uploaded_file = self.conversations.has_uploaded_file(&conversation_id).await;
                self.conversations
                    .append(&conversation_id, ChatMessage::user(request.prompt_text()))
                    .await;

                let mut delegator = Delegator::new(
                    self.registry.clone(),
                    self.reasoning.clone(),
                    self.metrics.clone(),
                    self.agent_timeout,
                );
                delegator
                    .delegate_chat(&request, has_uploaded_file, &history)
                    .await
            }
        };

        response.validate().map_err(|e| {
            log::error!("[CHAT] Malformed response from {:?}: {}", resolver, e);
            ChatError::MalformedResponse(e)
        })?;

        let message = response.to_chat_message(resolver.as_deref());
        self.conversations.append(&conversation_id, message.clone()).await;

        match resolver {
            Some(_) => Ok(message),
            None => Err(ChatError::Unresolved(message)),
        }
    }
}
