use crate::agents::{Agent, AgentError, AgentResponse, ChatRequest};
use async_trait::async_trait;

/// Prepares a rewards claim for the connected wallet. No reasoning call.
#[derive(Default)]
pub struct RewardsAgent;

impl RewardsAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for RewardsAgent {
    fn name(&self) -> &str {
        "rewards"
    }

    async fn process_request(&self, request: &ChatRequest) -> Result<AgentResponse, AgentError> {
        let wallet = request.wallet().ok_or_else(|| {
            AgentError::Validation("Please connect your wallet to check and claim rewards.".to_string())
        })?;

        let mut response = AgentResponse::action_required(
            "Your rewards are ready to claim. Please confirm the claim transaction in your wallet.",
            "claim",
        )
        .with_metadata("wallet_address", wallet);
        if let Some(chain_id) = request.chain_id {
            response = response.with_metadata("chain_id", chain_id);
        }
        Ok(response)
    }
}
