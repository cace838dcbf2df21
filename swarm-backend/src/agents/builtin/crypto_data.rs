//! Market data agent
//!
//! The reasoning capability picks one market tool and extracts the coin,
//! protocol or collection name. Only tools backed by the data source's
//! capability set are offered.

use crate::agents::{parse_args, Agent, AgentError, AgentResponse, ChatRequest};
use crate::ai::ReasoningClient;
use crate::tools::market_data::MarketQuote;
use crate::tools::{MarketCapability, MarketDataError, MarketDataSource, PropertySchema, ToolDefinition, ToolInputSchema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use strum::IntoEnumIterator;

const SYSTEM_PROMPT: &str = "Don't make assumptions about the value of the arguments for the \
functions. Ask for clarification if a user request is ambiguous. Only use the functions you have \
been provided with.";

const MISSING_NAME: &str = "I need more information to answer that. Could you please provide the \
name of the coin, protocol or collection you are interested in?";

pub struct CryptoDataAgent {
    reasoning: Arc<dyn ReasoningClient>,
    source: Arc<dyn MarketDataSource>,
}

#[derive(Debug, Deserialize)]
struct NameArgs {
    #[serde(default, alias = "coin_name", alias = "protocol_name", alias = "nft_name")]
    name: Option<String>,
}

fn tool_name(capability: MarketCapability) -> String {
    format!("get_{}", capability.as_ref())
}

fn capability_for_tool(name: &str) -> Option<MarketCapability> {
    MarketCapability::iter().find(|c| tool_name(*c) == name)
}

fn describe(capability: MarketCapability) -> (&'static str, &'static str, &'static str) {
    match capability {
        MarketCapability::Price => (
            "Get the current price of a cryptocurrency in USD",
            "The name of the coin",
            "price",
        ),
        MarketCapability::MarketCap => (
            "Get the market capitalization of a cryptocurrency in USD",
            "The name of the coin",
            "market cap",
        ),
        MarketCapability::FullyDilutedValuation => (
            "Get the fully diluted valuation of a cryptocurrency in USD",
            "The name of the coin",
            "fully diluted valuation",
        ),
        MarketCapability::TotalValueLocked => (
            "Get the total value locked (TVL) of a DeFi protocol in USD",
            "The name of the protocol",
            "total value locked",
        ),
        MarketCapability::FloorPrice => (
            "Get the floor price of an NFT collection in USD",
            "The name of the NFT collection",
            "floor price",
        ),
    }
}

// Significant digits kept for sub-dollar values
const SUB_DOLLAR_PRECISION: usize = 4;

fn format_usd(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude > 0.0 && magnitude < 1.0 {
        let leading_zeros = (-magnitude.log10()).floor() as usize;
        let decimals = (leading_zeros + SUB_DOLLAR_PRECISION).clamp(2, 18);
        let mut digits = format!("{:.*}", decimals, magnitude);
        let dot = digits.find('.').unwrap_or(digits.len());
        while digits.ends_with('0') && digits.len() - dot > 3 {
            digits.pop();
        }
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{}${}", sign, digits);
    }

    let cents = (value * 100.0).round() as i128;
    let (whole, frac) = (cents.abs() / 100, cents.abs() % 100);
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, frac)
}

impl CryptoDataAgent {
    pub fn new(reasoning: Arc<dyn ReasoningClient>, source: Arc<dyn MarketDataSource>) -> Self {
        Self { reasoning, source }
    }

    async fn fetch(&self, capability: MarketCapability, name: &str) -> Result<MarketQuote, MarketDataError> {
        match capability {
            MarketCapability::Price => self.source.price(name).await,
            MarketCapability::MarketCap => self.source.market_cap(name).await,
            MarketCapability::FullyDilutedValuation => self.source.fully_diluted_valuation(name).await,
            MarketCapability::TotalValueLocked => self.source.total_value_locked(name).await,
            MarketCapability::FloorPrice => self.source.floor_price(name).await,
        }
    }
}

#[async_trait]
impl Agent for CryptoDataAgent {
    fn name(&self) -> &str {
        "crypto_data"
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn reasoning(&self) -> Option<&dyn ReasoningClient> {
        Some(self.reasoning.as_ref())
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        self.source
            .capabilities()
            .iter()
            .map(|&capability| {
                let (description, arg_description, _) = describe(capability);
                ToolDefinition::new(
                    &tool_name(capability),
                    description,
                    ToolInputSchema::default().with_property(
                        "name",
                        PropertySchema::string(arg_description),
                        true,
                    ),
                )
            })
            .collect()
    }

    async fn execute_tool(
        &self,
        name: &str,
        args: &Value,
        _request: &ChatRequest,
    ) -> Result<AgentResponse, AgentError> {
        let capability = capability_for_tool(name)
            .filter(|c| self.source.supports(*c))
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;

        let args: NameArgs = parse_args(name, args)?;
        let target = args
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AgentError::Validation(MISSING_NAME.to_string()))?;

        let quote = self.fetch(capability, &target).await.map_err(|e| match e {
            MarketDataError::NotFound(what) => AgentError::Validation(format!(
                "I couldn't find any data for '{}'. Could you please provide the name of the coin, \
                 protocol or collection exactly as it is listed?",
                what
            )),
            other => AgentError::Tool(other.to_string()),
        })?;

        let (_, _, label) = describe(capability);
        log::info!("[CRYPTO_DATA] {} of {} = {}", label, quote.id, quote.value);

        Ok(AgentResponse::success(format!(
            "The {} of {} is {}",
            label,
            quote.name.to_lowercase(),
            format_usd(quote.value)
        ))
        .with_metadata("coinId", quote.id)
        .with_metadata("value", quote.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ResponseType;
    use crate::ai::AiResponse;
    use crate::test_support::{ScriptedReasoning, StaticMarket};
    use serde_json::json;

    fn agent(llm: AiResponse) -> CryptoDataAgent {
        CryptoDataAgent::new(
            Arc::new(ScriptedReasoning::with_completions(vec![Ok(llm)])),
            Arc::new(StaticMarket::bitcoin_only()),
        )
    }

    #[tokio::test]
    async fn test_price_lookup_success() {
        let agent = agent(AiResponse::tool_call("get_price", json!({"name": "Bitcoin"})));
        let response = agent
            .chat(&ChatRequest::new("What's the price of Bitcoin?", "c1"))
            .await
            .unwrap();
        assert_eq!(response.response_type(), ResponseType::Success);
        assert_eq!(response.content(), "The price of bitcoin is $50,000.00");
        assert_eq!(response.metadata()["coinId"], json!("bitcoin"));
    }

    #[tokio::test]
    async fn test_missing_coin_name_needs_info() {
        let agent = agent(AiResponse::tool_call("get_price", json!({})));
        let response = agent
            .chat(&ChatRequest::new("Do something invalid", "c1"))
            .await
            .unwrap();
        assert_eq!(response.response_type(), ResponseType::NeedsInfo);
        assert!(response.content().contains("please provide the name of the coin"));
    }

    #[tokio::test]
    async fn test_unknown_coin_needs_info() {
        let agent = agent(AiResponse::tool_call("get_market_cap", json!({"name": "dogwifhat"})));
        let response = agent.chat(&ChatRequest::new("mcap of wif", "c1")).await.unwrap();
        assert_eq!(response.response_type(), ResponseType::NeedsInfo);
    }

    #[tokio::test]
    async fn test_unsupported_tool_is_error() {
        let agent = agent(AiResponse::tool_call("get_floor_price", json!({"name": "punks"})));
        let response = agent.chat(&ChatRequest::new("punks floor", "c1")).await.unwrap();
        assert_eq!(response.response_type(), ResponseType::Error);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error() {
        let agent = agent(AiResponse::tool_call("get_price", json!({"name": "outage"})));
        let response = agent.chat(&ChatRequest::new("price of outage", "c1")).await.unwrap();
        assert!(response.is_error());
    }

    #[test]
    fn test_tools_follow_capabilities() {
        let agent = agent(AiResponse::default());
        let names: Vec<String> = agent.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["get_price", "get_market_cap"]);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(50000.0), "$50,000.00");
        assert_eq!(format_usd(0.5), "$0.50");
        assert_eq!(format_usd(1234567.891), "$1,234,567.89");
        assert_eq!(format_usd(999.0), "$999.00");
        assert_eq!(format_usd(0.0), "$0.00");
    }

    #[test]
    fn test_format_usd_keeps_sub_cent_precision() {
        assert_eq!(format_usd(0.00001234), "$0.00001234");
        assert_eq!(format_usd(0.004), "$0.004");
        assert_eq!(format_usd(0.0512345), "$0.05123");
        assert_eq!(format_usd(0.1), "$0.10");
        assert_eq!(format_usd(-0.00002), "-$0.00002");
    }
}
