//! Compiled-in agent implementations
//!
//! `AgentKind` is the registration table: every catalog entry names one of
//! these kinds and `AgentKind::build` constructs it from shared services.

pub mod crypto_data;
pub mod default;
pub mod document_analyzer;
pub mod rewards;
pub mod token_swap;
pub mod tweet_sizzler;

use super::agent::Agent;
use super::registry::AgentRegistry;
use super::types::AgentDescriptor;
use crate::ai::ReasoningClient;
use crate::conversation::ConversationStore;
use crate::tools::{MarketDataSource, TokenBook};
use std::str::FromStr;
use std::sync::Arc;
use strum::{AsRefStr, EnumIter, EnumString};

pub use crypto_data::CryptoDataAgent;
pub use default::DefaultAgent;
pub use document_analyzer::DocumentAnalyzerAgent;
pub use rewards::RewardsAgent;
pub use token_swap::TokenSwapAgent;
pub use tweet_sizzler::TweetSizzlerAgent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum AgentKind {
    Default,
    CryptoData,
    TokenSwap,
    Rewards,
    TweetSizzler,
    DocumentAnalyzer,
}

/// Services handed to agents at construction time
#[derive(Clone)]
pub struct AgentDeps {
    pub reasoning: Arc<dyn ReasoningClient>,
    pub market_data: Arc<dyn MarketDataSource>,
    pub tokens: Arc<TokenBook>,
    pub conversations: Arc<ConversationStore>,
}

impl AgentKind {
    pub fn build(self, deps: &AgentDeps) -> Arc<dyn Agent> {
        match self {
            AgentKind::Default => Arc::new(DefaultAgent::new(deps.reasoning.clone())),
            AgentKind::CryptoData => Arc::new(CryptoDataAgent::new(
                deps.reasoning.clone(),
                deps.market_data.clone(),
            )),
            AgentKind::TokenSwap => Arc::new(TokenSwapAgent::new(
                deps.reasoning.clone(),
                deps.tokens.clone(),
            )),
            AgentKind::Rewards => Arc::new(RewardsAgent::new()),
            AgentKind::TweetSizzler => Arc::new(TweetSizzlerAgent::new(
                deps.reasoning.clone(),
                deps.conversations.clone(),
            )),
            AgentKind::DocumentAnalyzer => Arc::new(DocumentAnalyzerAgent::new(
                deps.reasoning.clone(),
                deps.conversations.clone(),
            )),
        }
    }
}

/// Build a registry for `catalog` with every entry's implementation attached
pub fn create_default_registry(
    catalog: Vec<AgentDescriptor>,
    default_selected: usize,
    deps: &AgentDeps,
) -> AgentRegistry {
    let kinds: Vec<AgentKind> = catalog
        .iter()
        .filter_map(|d| match AgentKind::from_str(&d.name) {
            Ok(kind) => Some(kind),
            Err(_) => {
                log::warn!("[REGISTRY] No implementation for catalog entry '{}'", d.name);
                None
            }
        })
        .collect();

    let mut registry = AgentRegistry::new(catalog, default_selected);
    for kind in kinds {
        if let Err(e) = registry.register_agent(kind.build(deps)) {
            log::warn!("[REGISTRY] Failed to register {}: {}", kind.as_ref(), e);
        }
    }

    log::info!(
        "[REGISTRY] {} agents available, selected: {:?}",
        registry.get_available_agents().len(),
        registry.get_selected_agents()
    );
    registry
}
