use crate::agents::Agent;
use crate::ai::ReasoningClient;
use async_trait::async_trait;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a helpful assistant for a crypto-focused chat application. \
Answer general questions clearly and concisely. If a question needs live market data, token swaps \
or other specialised actions you cannot perform, say so briefly.";

/// General-purpose fallback agent: a plain reply with conversation context
pub struct DefaultAgent {
    reasoning: Arc<dyn ReasoningClient>,
}

impl DefaultAgent {
    pub fn new(reasoning: Arc<dyn ReasoningClient>) -> Self {
        Self { reasoning }
    }
}

#[async_trait]
impl Agent for DefaultAgent {
    fn name(&self) -> &str {
        "default"
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn reasoning(&self) -> Option<&dyn ReasoningClient> {
        Some(self.reasoning.as_ref())
    }
}
