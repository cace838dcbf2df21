use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub llm_endpoint: Option<String>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_max_tokens: u32,
    pub coingecko_api_key: Option<String>,
    pub coingecko_base_url: Option<String>,
    pub defillama_base_url: Option<String>,
    pub default_selected_agents: usize,
    pub agent_timeout: Duration,
    pub request_timeout: Duration,
    pub conversation_history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            llm_endpoint: None,
            llm_model: None,
            llm_api_key: None,
            llm_max_tokens: 4096,
            coingecko_api_key: None,
            coingecko_base_url: None,
            defillama_base_url: None,
            default_selected_agents: 6,
            agent_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(180),
            conversation_history_limit: 20,
        }
    }
}

/// Non-empty env var
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a numeric env var, keeping the default when it is unset or malformed
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match optional(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("[CONFIG] Invalid value for {}: '{}', using default", key, raw);
            default
        }),
        None => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed("PORT", defaults.port),
            llm_endpoint: optional("LLM_ENDPOINT"),
            llm_model: optional("LLM_MODEL"),
            llm_api_key: optional("LLM_API_KEY"),
            llm_max_tokens: parsed("LLM_MAX_TOKENS", defaults.llm_max_tokens),
            coingecko_api_key: optional("COINGECKO_API_KEY"),
            coingecko_base_url: optional("COINGECKO_BASE_URL"),
            defillama_base_url: optional("DEFILLAMA_BASE_URL"),
            default_selected_agents: parsed("DEFAULT_SELECTED_AGENTS", defaults.default_selected_agents),
            agent_timeout: Duration::from_secs(parsed(
                "AGENT_TIMEOUT_SECS",
                defaults.agent_timeout.as_secs(),
            )),
            request_timeout: Duration::from_secs(parsed(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            conversation_history_limit: parsed(
                "CONVERSATION_HISTORY_LIMIT",
                defaults.conversation_history_limit,
            ),
        }
    }
}
