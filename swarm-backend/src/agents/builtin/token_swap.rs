//! Token swap agent
//!
//! Extracts swap parameters with the reasoning capability and resolves
//! symbols against the configured token book. The result is a swap the UI
//! must confirm and sign; nothing is submitted from here.

use crate::agents::{parse_args, Agent, AgentError, AgentResponse, ChatRequest};
use crate::ai::ReasoningClient;
use crate::tools::token_lookup::network_for_chain;
use crate::tools::{PropertySchema, TokenBook, ToolDefinition, ToolInputSchema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You help users swap tokens. Extract the source token, the destination \
token and the amount to swap from the request. Don't make assumptions about the value of the \
arguments; ask for clarification if the request is ambiguous.";

pub struct TokenSwapAgent {
    reasoning: Arc<dyn ReasoningClient>,
    tokens: Arc<TokenBook>,
}

#[derive(Debug, Deserialize)]
struct SwapArgs {
    #[serde(default)]
    source_token: Option<String>,
    #[serde(default)]
    destination_token: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
}

/// Accept amounts as numbers or numeric strings
fn parse_amount(amount: Option<&Value>) -> Option<f64> {
    let value = match amount? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn required(value: Option<String>, what: &str) -> Result<String, AgentError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AgentError::Validation(format!("Which token would you like to swap {}?", what)))
}

impl TokenSwapAgent {
    pub fn new(reasoning: Arc<dyn ReasoningClient>, tokens: Arc<TokenBook>) -> Self {
        Self { reasoning, tokens }
    }
}

#[async_trait]
impl Agent for TokenSwapAgent {
    fn name(&self) -> &str {
        "token_swap"
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn reasoning(&self) -> Option<&dyn ReasoningClient> {
        Some(self.reasoning.as_ref())
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "swap_tokens",
            "Construct a token swap transaction",
            ToolInputSchema::default()
                .with_property("source_token", PropertySchema::string("Symbol of the token to sell"), true)
                .with_property("destination_token", PropertySchema::string("Symbol of the token to buy"), true)
                .with_property("amount", PropertySchema::number("Amount of the source token to swap"), true),
        )]
    }

    async fn process_request(&self, request: &ChatRequest) -> Result<AgentResponse, AgentError> {
        if request.wallet().is_none() {
            return Err(AgentError::Validation(
                "Please connect your wallet before swapping tokens.".to_string(),
            ));
        }
        let chain_id = request.chain_id.unwrap_or_default();
        if network_for_chain(chain_id).is_none() {
            return Err(AgentError::Validation(format!(
                "Swaps are not supported on chain {}. Please switch to Ethereum, Base or Arbitrum.",
                chain_id
            )));
        }

        let messages = crate::agents::agent::build_messages(&self.system_prompt(), request);
        let response = self
            .reasoning
            .complete(messages, self.tools())
            .await
            .map_err(AgentError::Reasoning)?;

        match response.first_tool_call() {
            Some(call) => self.execute_tool(&call.name, &call.arguments, request).await,
            None if !response.content.trim().is_empty() => Ok(AgentResponse::needs_info(response.content)),
            None => Err(AgentError::Reasoning("empty response".to_string())),
        }
    }

    async fn execute_tool(
        &self,
        name: &str,
        args: &Value,
        request: &ChatRequest,
    ) -> Result<AgentResponse, AgentError> {
        if name != "swap_tokens" {
            return Err(AgentError::UnknownTool(name.to_string()));
        }
        let args: SwapArgs = parse_args(name, args)?;

        let wallet = request
            .wallet()
            .ok_or_else(|| AgentError::Validation("Please connect your wallet.".to_string()))?;
        let chain_id = request.chain_id.unwrap_or_default();
        let network = network_for_chain(chain_id)
            .ok_or_else(|| AgentError::Validation(format!("Unsupported chain {}", chain_id)))?;

        let source = required(args.source_token, "from")?;
        let destination = required(args.destination_token, "to")?;
        let amount = parse_amount(args.amount.as_ref()).ok_or_else(|| {
            AgentError::Validation(format!("How much {} would you like to swap?", source))
        })?;

        let resolve = |symbol: &str| {
            self.tokens.lookup(symbol, network).ok_or_else(|| {
                AgentError::Validation(format!(
                    "I don't know the token '{}' on {}. Available tokens: {}",
                    symbol,
                    network,
                    self.tokens.list_available(network).join(", ")
                ))
            })
        };
        let src = resolve(&source)?;
        let dst = resolve(&destination)?;

        if src.address.eq_ignore_ascii_case(&dst.address) {
            return Err(AgentError::Validation(
                "The source and destination tokens must be different.".to_string(),
            ));
        }

        log::info!(
            "[TOKEN_SWAP] {} {} -> {} on {} for {}",
            amount,
            source.to_uppercase(),
            destination.to_uppercase(),
            network,
            wallet
        );

        Ok(AgentResponse::action_required(
            format!(
                "Ready to swap {} {} for {} on {}. Please confirm the transaction in your wallet.",
                amount,
                source.to_uppercase(),
                destination.to_uppercase(),
                network
            ),
            "swap",
        )
        .with_metadata("src", json!({"symbol": source.to_uppercase(), "address": src.address, "decimals": src.decimals}))
        .with_metadata("dst", json!({"symbol": destination.to_uppercase(), "address": dst.address, "decimals": dst.decimals}))
        .with_metadata("src_amount", amount)
        .with_metadata("chain_id", chain_id)
        .with_metadata("wallet_address", wallet))
    }
}
