use super::response::AgentResponse;
use super::types::{AgentError, ChatRequest};
use crate::ai::{Message, ReasoningClient};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A specialised agent. `chat` is the only entry point the delegator uses.
///
/// The provided `chat` runs the shared template: reject an empty prompt,
/// run `process_request`, and fold any `AgentError` into a response
/// (validation errors become NeedsInfo, everything else becomes Error).
/// The default `process_request` asks the reasoning capability for a reply
/// with `tools()` attached and dispatches a returned tool call to
/// `execute_tool`. Variants override whichever step they need.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn system_prompt(&self) -> String {
        String::new()
    }

    fn reasoning(&self) -> Option<&dyn ReasoningClient> {
        None
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// An `Err` here means the agent failed to contain a failure; the
    /// delegator treats it as a soft error.
    async fn chat(&self, request: &ChatRequest) -> Result<AgentResponse, AgentError> {
        if request.prompt_text().trim().is_empty() {
            return Ok(AgentResponse::needs_info(
                "Please provide a message so I can help you.",
            ));
        }

        match self.process_request(request).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_validation() => {
                log::info!("[AGENT:{}] Needs more info: {}", self.name(), e);
                Ok(AgentResponse::needs_info(e.to_string()))
            }
            Err(e) => {
                log::error!("[AGENT:{}] Failed to process request: {}", self.name(), e);
                Ok(AgentResponse::error(e.to_string()))
            }
        }
    }

    async fn process_request(&self, request: &ChatRequest) -> Result<AgentResponse, AgentError> {
        let client = self.reasoning().ok_or_else(|| {
            AgentError::Internal(format!("agent '{}' has no reasoning capability", self.name()))
        })?;

        let messages = build_messages(&self.system_prompt(), request);
        let response = client
            .complete(messages, self.tools())
            .await
            .map_err(AgentError::Reasoning)?;

        if let Some(call) = response.first_tool_call() {
            log::info!("[AGENT:{}] Tool call: {}", self.name(), call.name);
            return self.execute_tool(&call.name, &call.arguments, request).await;
        }

        if response.content.trim().is_empty() {
            return Err(AgentError::Reasoning("empty response".to_string()));
        }
        Ok(AgentResponse::success(response.content))
    }

    async fn execute_tool(
        &self,
        name: &str,
        _args: &Value,
        _request: &ChatRequest,
    ) -> Result<AgentResponse, AgentError> {
        Err(AgentError::UnknownTool(name.to_string()))
    }
}

/// System prompt, prior turns, then the current user prompt
pub fn build_messages(system_prompt: &str, request: &ChatRequest) -> Vec<Message> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if !system_prompt.is_empty() {
        messages.push(Message::system(system_prompt));
    }
    messages.extend(request.history.iter().cloned());
    messages.push(Message::user(request.prompt_text()));
    messages
}

/// Deserialize tool-call arguments, reporting shape problems as a malformed call
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, AgentError> {
    if !args.is_object() {
        return Err(AgentError::MalformedToolCall {
            tool: tool.to_string(),
            reason: format!("expected a JSON object, got {}", args),
        });
    }
    serde_json::from_value(args.clone()).map_err(|e| AgentError::MalformedToolCall {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::response::ResponseType;
    use crate::ai::{AiResponse, MessageRole};
    use crate::test_support::ScriptedReasoning;
    use serde::Deserialize;
    use serde_json::json;

    struct EchoAgent {
        llm: ScriptedReasoning,
    }

    #[async_trait]
    impl Agent for EchoAgent {
        fn name(&self) -> &str {
            "echo"
        }

        fn system_prompt(&self) -> String {
            "You echo things.".to_string()
        }

        fn reasoning(&self) -> Option<&dyn ReasoningClient> {
            Some(&self.llm)
        }

        async fn execute_tool(
            &self,
            name: &str,
            args: &Value,
            _request: &ChatRequest,
        ) -> Result<AgentResponse, AgentError> {
            #[derive(Deserialize)]
            struct Args {
                #[serde(default)]
                text: Option<String>,
            }
            match name {
                "echo" => {
                    let args: Args = parse_args(name, args)?;
                    let text = args
                        .text
                        .ok_or_else(|| AgentError::Validation("What should I echo?".into()))?;
                    Ok(AgentResponse::success(text))
                }
                "explode" => Err(AgentError::Tool("kaboom".into())),
                other => Err(AgentError::UnknownTool(other.to_string())),
            }
        }
    }

    fn agent(response: AiResponse) -> EchoAgent {
        EchoAgent {
            llm: ScriptedReasoning::with_completions(vec![Ok(response)]),
        }
    }

    #[tokio::test]
    async fn test_empty_prompt_needs_info_without_llm_call() {
        let agent = agent(AiResponse::text("unused"));
        let response = agent.chat(&ChatRequest::new("   ", "c1")).await.unwrap();
        assert_eq!(response.response_type(), ResponseType::NeedsInfo);
        assert_eq!(agent.llm.completion_calls(), 0);
    }

    #[tokio::test]
    async fn test_direct_text_is_success() {
        let agent = agent(AiResponse::text("hello there"));
        let response = agent.chat(&ChatRequest::new("hi", "c1")).await.unwrap();
        assert_eq!(response.response_type(), ResponseType::Success);
        assert_eq!(response.content(), "hello there");
    }

    #[tokio::test]
    async fn test_tool_call_dispatch() {
        let agent = agent(AiResponse::tool_call("echo", json!({"text": "ping"})));
        let response = agent.chat(&ChatRequest::new("echo ping", "c1")).await.unwrap();
        assert_eq!(response.content(), "ping");
    }

    #[tokio::test]
    async fn test_validation_error_becomes_needs_info() {
        let agent = agent(AiResponse::tool_call("echo", json!({})));
        let response = agent.chat(&ChatRequest::new("echo", "c1")).await.unwrap();
        assert_eq!(response.response_type(), ResponseType::NeedsInfo);
        assert_eq!(response.content(), "What should I echo?");
    }

    #[tokio::test]
    async fn test_other_failures_become_error() {
        for call in [
            AiResponse::tool_call("explode", json!({})),
            AiResponse::tool_call("unknown_tool", json!({})),
            AiResponse::tool_call("echo", Value::String("not json".into())),
            AiResponse::text("   "),
        ] {
            let agent = agent(call);
            let response = agent.chat(&ChatRequest::new("go", "c1")).await.unwrap();
            assert_eq!(response.response_type(), ResponseType::Error);
        }
    }

    #[tokio::test]
    async fn test_reasoning_failure_becomes_error() {
        let agent = EchoAgent {
            llm: ScriptedReasoning::with_completions(vec![Err("503 Service Unavailable".into())]),
        };
        let response = agent.chat(&ChatRequest::new("hi", "c1")).await.unwrap();
        assert!(response.is_error());
        assert!(response.error_message().unwrap().contains("503"));
    }

    #[test]
    fn test_build_messages_order() {
        let mut request = ChatRequest::new("and now?", "c1");
        request.history = vec![Message::user("before"), Message::assistant("reply")];
        let messages = build_messages("system", &request);
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(messages.last().unwrap().content, "and now?");
        assert_eq!(build_messages("", &request).len(), 3);
    }
}
