use crate::agents::agent::build_messages;
use crate::agents::{Agent, AgentError, AgentResponse, ChatRequest};
use crate::ai::ReasoningClient;
use crate::conversation::ConversationStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Upper bound on document text included in the prompt
const MAX_DOCUMENT_CHARS: usize = 24_000;

/// Answers questions about the document uploaded to the conversation
pub struct DocumentAnalyzerAgent {
    reasoning: Arc<dyn ReasoningClient>,
    conversations: Arc<ConversationStore>,
}

impl DocumentAnalyzerAgent {
    pub fn new(reasoning: Arc<dyn ReasoningClient>, conversations: Arc<ConversationStore>) -> Self {
        Self {
            reasoning,
            conversations,
        }
    }
}

#[async_trait]
impl Agent for DocumentAnalyzerAgent {
    fn name(&self) -> &str {
        "document_analyzer"
    }

    fn reasoning(&self) -> Option<&dyn ReasoningClient> {
        Some(self.reasoning.as_ref())
    }

    async fn process_request(&self, request: &ChatRequest) -> Result<AgentResponse, AgentError> {
        let document = self
            .conversations
            .uploaded_document(&request.conversation_id)
            .await
            .ok_or_else(|| {
                AgentError::Validation("Please upload a document first so I can analyze it.".to_string())
            })?;

        let excerpt: String = document.content.chars().take(MAX_DOCUMENT_CHARS).collect();
        let system_prompt = format!(
            "You answer questions about the document '{}'. Base your answers only on its content \
             and say so when the document does not contain the answer.\n\n--- DOCUMENT ---\n{}",
            document.filename, excerpt
        );

        let response = self
            .reasoning
            .complete(build_messages(&system_prompt, request), Vec::new())
            .await
            .map_err(AgentError::Reasoning)?;
        if response.content.trim().is_empty() {
            return Err(AgentError::Reasoning("empty response".to_string()));
        }

        Ok(AgentResponse::success(response.content).with_metadata("document", document.filename))
    }
}
