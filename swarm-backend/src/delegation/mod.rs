//! Ranking and sequential fallback across agents

pub mod delegator;
pub mod ranking;

pub use delegator::{Delegator, EXHAUSTED_MESSAGE, RANKING_ATTEMPTS};

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DelegationError {
    #[error("no agents available")]
    NoAgentsAvailable,
}

/// Process-wide counters shared by every per-request `Delegator`
#[derive(Debug, Default)]
pub struct DelegationMetrics {
    ranking_fallbacks: AtomicU64,
    agent_failures: AtomicU64,
    exhausted: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ranking_fallbacks: u64,
    pub agent_failures: u64,
    pub exhausted: u64,
}

impl DelegationMetrics {
    pub fn record_ranking_fallback(&self) {
        self.ranking_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_agent_failure(&self) {
        self.agent_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ranking_fallbacks: self.ranking_fallbacks.load(Ordering::Relaxed),
            agent_failures: self.agent_failures.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}
