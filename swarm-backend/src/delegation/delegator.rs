//! Per-request delegator
//!
//! A `Delegator` is built fresh for every top-level chat request. It asks the
//! reasoning capability to shortlist agents, then tries them strictly one at
//! a time in ranked order. Only an `Error` outcome (or an agent that fails,
//! hangs or panics) moves on to the next candidate; Success, NeedsInfo and
//! ActionRequired all end the search.

use super::ranking::{parse_ranking, ranking_messages, ranking_schema, SCHEMA_NAME};
use super::{DelegationError, DelegationMetrics};
use crate::agents::{AgentRegistry, AgentResponse, ChatRequest};
use crate::ai::ReasoningClient;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub const RANKING_ATTEMPTS: usize = 3;
pub const DEFAULT_AGENT: &str = "default";
pub const EXHAUSTED_MESSAGE: &str = "All selected agents have been attempted without success";

/// Cancels a spawned attempt once it is no longer awaited, including when
/// the whole request future is dropped by the outer timeout.
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct Delegator {
    registry: Arc<AgentRegistry>,
    reasoning: Arc<dyn ReasoningClient>,
    metrics: Arc<DelegationMetrics>,
    agent_timeout: Duration,
    attempted_agents: HashSet<String>,
    selected_agents_for_request: Vec<String>,
}

impl Delegator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        reasoning: Arc<dyn ReasoningClient>,
        metrics: Arc<DelegationMetrics>,
        agent_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            reasoning,
            metrics,
            agent_timeout,
            attempted_agents: HashSet::new(),
            selected_agents_for_request: Vec::new(),
        }
    }

    pub fn attempted_agents(&self) -> &HashSet<String> {
        &self.attempted_agents
    }

    pub fn selected_agents_for_request(&self) -> &[String] {
        &self.selected_agents_for_request
    }

    /// Shortlist up to three agents for `request`, most relevant first.
    ///
    /// Falls back to `["default"]` when nothing is left to rank (as long as
    /// default has not been tried) and when the ranking output stays
    /// unparseable after `RANKING_ATTEMPTS` tries.
    pub async fn get_delegator_response(
        &mut self,
        request: &ChatRequest,
        has_uploaded_file: bool,
        history: &str,
    ) -> Result<Vec<String>, DelegationError> {
        let candidates = self
            .registry
            .get_available_unattempted_agents(&self.attempted_agents, has_uploaded_file);

        if candidates.is_empty() {
            if self.attempted_agents.contains(DEFAULT_AGENT) {
                log::error!("[DELEGATOR] No agents left to rank");
                return Err(DelegationError::NoAgentsAvailable);
            }
            log::warn!("[DELEGATOR] No candidates, forcing '{}'", DEFAULT_AGENT);
            return Ok(self.record(vec![DEFAULT_AGENT.to_string()]));
        }

        let names: Vec<&str> = candidates.iter().map(|d| d.name.as_str()).collect();
        log::info!("[DELEGATOR] Ranking candidates: {:?}", names);

        let messages = ranking_messages(&candidates, request.prompt_text(), history);
        let schema = ranking_schema(&candidates);

        for attempt in 1..=RANKING_ATTEMPTS {
            match self
                .reasoning
                .complete_json(messages.clone(), SCHEMA_NAME, schema.clone())
                .await
            {
                Ok(raw) => match parse_ranking(&raw) {
                    Some(ranked) => {
                        log::info!("[DELEGATOR] Ranked agents: {:?}", ranked);
                        return Ok(self.record(ranked));
                    }
                    None => log::warn!(
                        "[DELEGATOR] Unparseable ranking output (attempt {}/{}): {}",
                        attempt,
                        RANKING_ATTEMPTS,
                        raw
                    ),
                },
                Err(e) => log::warn!(
                    "[DELEGATOR] Ranking call failed (attempt {}/{}): {}",
                    attempt,
                    RANKING_ATTEMPTS,
                    e
                ),
            }
        }

        log::warn!(
            "[DELEGATOR] Ranking failed {} times, degrading to '{}'",
            RANKING_ATTEMPTS,
            DEFAULT_AGENT
        );
        self.metrics.record_ranking_fallback();
        Ok(self.record(vec![DEFAULT_AGENT.to_string()]))
    }

    fn record(&mut self, ranked: Vec<String>) -> Vec<String> {
        self.selected_agents_for_request = ranked.clone();
        ranked
    }

    /// Rank, then try each shortlisted agent in order until one produces a
    /// non-Error response. Returns the resolving agent's name, or `None` with
    /// a generic error when nothing resolved.
    pub async fn delegate_chat(
        &mut self,
        request: &ChatRequest,
        has_uploaded_file: bool,
        history: &str,
    ) -> (Option<String>, AgentResponse) {
        let ranked = match self
            .get_delegator_response(request, has_uploaded_file, history)
            .await
        {
            Ok(ranked) => ranked,
            Err(e) => return (None, AgentResponse::error(e.to_string())),
        };

        for agent_name in ranked {
            if !self.attempted_agents.insert(agent_name.clone()) {
                log::debug!("[DELEGATOR] Agent '{}' already attempted, skipping", agent_name);
                continue;
            }

            let Some(agent) = self.registry.get_agent(&agent_name) else {
                log::warn!("[DELEGATOR] Agent '{}' could not be loaded, skipping", agent_name);
                continue;
            };

            log::info!("[DELEGATOR] Trying agent '{}'", agent_name);
            let owned_request = request.clone();
            let mut handle = tokio::spawn(async move { agent.chat(&owned_request).await });
            let _abort = AbortOnDrop(handle.abort_handle());

            let failure = match tokio::time::timeout(self.agent_timeout, &mut handle).await {
                Ok(Ok(Ok(response))) if !response.is_error() => {
                    log::info!(
                        "[DELEGATOR] Agent '{}' resolved with {}",
                        agent_name,
                        response.response_type()
                    );
                    return (Some(agent_name), response);
                }
                Ok(Ok(Ok(response))) => response
                    .error_message()
                    .unwrap_or(response.content())
                    .to_string(),
                Ok(Ok(Err(e))) => e.to_string(),
                Ok(Err(join_error)) => format!("agent task failed: {}", join_error),
                Err(_) => format!("timed out after {:?}", self.agent_timeout),
            };

            self.metrics.record_agent_failure();
            log::warn!("[DELEGATOR] Agent '{}' failed: {}", agent_name, failure);
        }

        log::error!(
            "[DELEGATOR] Exhausted agents {:?} without success",
            self.attempted_agents
        );
        self.metrics.record_exhausted();
        (None, AgentResponse::error(EXHAUSTED_MESSAGE))
    }
}
