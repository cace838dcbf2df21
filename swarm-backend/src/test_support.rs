//! Scripted collaborators shared by unit tests

use crate::agents::{
    Agent, AgentDeps, AgentDescriptor, AgentError, AgentRegistry, AgentResponse, ChatRequest,
};
use crate::ai::{AiResponse, Message, ReasoningClient};
use crate::conversation::ConversationStore;
use crate::tools::market_data::MarketQuote;
use crate::tools::{MarketCapability, MarketDataError, MarketDataSource, TokenBook, ToolDefinition};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Reasoning client that replays queued responses and records what it was sent
#[derive(Default)]
pub struct ScriptedReasoning {
    completions: Mutex<VecDeque<Result<AiResponse, String>>>,
    json: Mutex<VecDeque<Result<String, String>>>,
    sent: Mutex<Vec<Vec<Message>>>,
    completion_calls: AtomicUsize,
    json_calls: AtomicUsize,
}

impl ScriptedReasoning {
    pub fn with_completions(responses: Vec<Result<AiResponse, String>>) -> Self {
        Self {
            completions: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn with_json(responses: Vec<Result<String, String>>) -> Self {
        Self {
            json: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn push_json(&self, response: Result<String, String>) {
        self.json.lock().push_back(response);
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }

    pub fn json_calls(&self) -> usize {
        self.json_calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<Message> {
        self.sent.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedReasoning {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, String> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().push(messages);
        self.completions
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted completion".to_string()))
    }

    async fn complete_json(
        &self,
        messages: Vec<Message>,
        _schema_name: &str,
        _schema: Value,
    ) -> Result<String, String> {
        self.json_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().push(messages);
        self.json
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted ranking".to_string()))
    }
}

enum Behavior {
    Respond(AgentResponse),
    Fail,
    Panic,
    Sleep(Duration),
}

/// Agent with a fixed outcome and a call counter
pub struct ScriptedAgent {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedAgent {
    fn build(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn responding(name: &str, response: AgentResponse) -> Arc<Self> {
        Self::build(name, Behavior::Respond(response))
    }

    pub fn success(name: &str, content: &str) -> Arc<Self> {
        Self::responding(name, AgentResponse::success(content))
    }

    pub fn error(name: &str, message: &str) -> Arc<Self> {
        Self::responding(name, AgentResponse::error(message))
    }

    pub fn needs_info(name: &str, content: &str) -> Arc<Self> {
        Self::responding(name, AgentResponse::needs_info(content))
    }

    /// Returns `Err` from `chat` instead of a response
    pub fn failing(name: &str) -> Arc<Self> {
        Self::build(name, Behavior::Fail)
    }

    pub fn panicking(name: &str) -> Arc<Self> {
        Self::build(name, Behavior::Panic)
    }

    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Self::build(name, Behavior::Sleep(delay))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Slow calls that ran to the end of their sleep
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, _request: &ChatRequest) -> Result<AgentResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Respond(response) => Ok(response.clone()),
            Behavior::Fail => Err(AgentError::Internal(format!("{} blew up", self.name))),
            Behavior::Panic => panic!("{} panicked", self.name),
            Behavior::Sleep(delay) => {
                tokio::time::sleep(*delay).await;
                self.completed.fetch_add(1, Ordering::SeqCst);
                Ok(AgentResponse::success("too late"))
            }
        }
    }
}

/// Registry over the given scripted agents, all selected, in the given order
pub fn scripted_registry(agents: &[Arc<ScriptedAgent>]) -> Arc<AgentRegistry> {
    let catalog = agents
        .iter()
        .map(|a| AgentDescriptor::new(a.name(), &format!("Scripted agent {}", a.name())))
        .collect::<Vec<_>>();
    let mut registry = AgentRegistry::new(catalog, agents.len());
    for agent in agents {
        registry
            .register_agent(agent.clone())
            .expect("scripted agent has a descriptor");
    }
    Arc::new(registry)
}

pub fn test_catalog() -> Vec<AgentDescriptor> {
    vec![
        AgentDescriptor::new("default", "General questions and anything no other agent covers"),
        AgentDescriptor::new("crypto_data", "Prices, market caps, FDV, TVL and NFT floor prices"),
        AgentDescriptor::new("token_swap", "Swaps one token for another").with_command("swap"),
        AgentDescriptor::new("rewards", "Checks and claims rewards"),
        AgentDescriptor::new("tweet_sizzler", "Writes tweets").with_command("tweet"),
        AgentDescriptor::new("document_analyzer", "Answers questions about an uploaded document")
            .with_command("document")
            .with_upload_required(true),
    ]
}

pub fn test_tokens() -> TokenBook {
    TokenBook::from_ron(
        r#"{
            "base": {
                "ETH": (address: "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE", decimals: 18, name: "Ether"),
                "USDC": (address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", decimals: 6, name: "USD Coin"),
            },
        }"#,
    )
    .expect("test tokens parse")
}

/// Market source that knows bitcoin and fails on "outage"
pub struct StaticMarket {
    capabilities: Vec<MarketCapability>,
}

impl StaticMarket {
    pub fn bitcoin_only() -> Self {
        Self {
            capabilities: vec![MarketCapability::Price, MarketCapability::MarketCap],
        }
    }

    fn quote(&self, name: &str, value: f64) -> Result<MarketQuote, MarketDataError> {
        match name.to_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(MarketQuote {
                id: "bitcoin".to_string(),
                name: "Bitcoin".to_string(),
                value,
            }),
            "outage" => Err(MarketDataError::Http("503 Service Unavailable".to_string())),
            _ => Err(MarketDataError::NotFound(name.to_string())),
        }
    }
}

#[async_trait]
impl MarketDataSource for StaticMarket {
    fn capabilities(&self) -> &[MarketCapability] {
        &self.capabilities
    }

    async fn price(&self, coin_name: &str) -> Result<MarketQuote, MarketDataError> {
        self.quote(coin_name, 50_000.0)
    }

    async fn market_cap(&self, coin_name: &str) -> Result<MarketQuote, MarketDataError> {
        self.quote(coin_name, 1_000_000_000_000.0)
    }
}

pub fn test_deps(completions: Vec<Result<AiResponse, String>>) -> AgentDeps {
    AgentDeps {
        reasoning: Arc::new(ScriptedReasoning::with_completions(completions)),
        market_data: Arc::new(StaticMarket::bitcoin_only()),
        tokens: Arc::new(test_tokens()),
        conversations: Arc::new(ConversationStore::new()),
    }
}

/// Application state over scripted agents, with the ranking client returned
/// so tests can queue ranking output
pub fn test_app_state(agents: &[Arc<ScriptedAgent>]) -> (crate::AppState, Arc<ScriptedReasoning>) {
    let registry = scripted_registry(agents);
    let conversations = Arc::new(ConversationStore::new());
    let reasoning = Arc::new(ScriptedReasoning::default());
    let metrics = Arc::new(crate::delegation::DelegationMetrics::default());
    let chat = crate::chat::ChatController::new(
        registry.clone(),
        conversations.clone(),
        reasoning.clone(),
        metrics.clone(),
    )
    .with_timeouts(Duration::from_millis(200), Duration::from_secs(2));

    let state = crate::AppState {
        config: crate::config::Config::default(),
        registry,
        conversations,
        chat: Arc::new(chat),
        metrics,
    };
    (state, reasoning)
}
