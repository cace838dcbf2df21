use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;

mod agents;
mod ai;
mod chat;
mod config;
mod controllers;
mod conversation;
mod delegation;
mod models;
mod tools;

#[cfg(test)]
mod test_support;

use agents::{create_default_registry, AgentDeps, AgentRegistry};
use ai::OpenAIClient;
use chat::ChatController;
use config::Config;
use conversation::ConversationStore;
use delegation::DelegationMetrics;
use tools::{CoinGeckoClient, TokenBook};

pub struct AppState {
    pub config: Config,
    pub registry: Arc<AgentRegistry>,
    pub conversations: Arc<ConversationStore>,
    pub chat: Arc<ChatController>,
    pub metrics: Arc<DelegationMetrics>,
}

fn io_error(message: String) -> std::io::Error {
    log::error!("{}", message);
    std::io::Error::other(message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    // Check ./config first, then ../config (for running from the crate directory)
    let config_dir = if Path::new("./config").exists() {
        Path::new("./config")
    } else if Path::new("../config").exists() {
        Path::new("../config")
    } else {
        return Err(io_error("Config directory not found in ./config or ../config".to_string()));
    };
    log::info!("Using config directory: {:?}", config_dir);

    let config = Config::from_env();
    let port = config.port;

    log::info!("Loading agent catalog");
    let catalog = agents::load_catalog(config_dir).map_err(|e| io_error(e.to_string()))?;

    log::info!("Loading token configs");
    let tokens = Arc::new(TokenBook::load(config_dir).unwrap_or_else(|e| {
        log::warn!("{}; token swaps will not resolve any symbols", e);
        TokenBook::default()
    }));

    if config.llm_api_key.is_none() {
        log::warn!("LLM_API_KEY not set; requests to the reasoning endpoint may be rejected");
    }
    let reasoning = Arc::new(
        OpenAIClient::new(
            config.llm_api_key.as_deref(),
            config.llm_endpoint.as_deref(),
            config.llm_model.as_deref(),
            Some(config.llm_max_tokens),
        )
        .map_err(io_error)?,
    );

    let market_data = Arc::new(
        CoinGeckoClient::new(
            config.coingecko_api_key.clone(),
            config.coingecko_base_url.clone(),
            config.defillama_base_url.clone(),
        )
        .map_err(io_error)?,
    );

    let conversations = Arc::new(ConversationStore::new());
    let metrics = Arc::new(DelegationMetrics::default());

    let deps = AgentDeps {
        reasoning: reasoning.clone(),
        market_data,
        tokens,
        conversations: conversations.clone(),
    };
    log::info!("Initializing agent registry");
    let registry = Arc::new(create_default_registry(
        catalog,
        config.default_selected_agents,
        &deps,
    ));

    let chat = Arc::new(
        ChatController::new(registry.clone(), conversations.clone(), reasoning, metrics.clone())
            .with_timeouts(config.agent_timeout, config.request_timeout)
            .with_history_limit(config.conversation_history_limit),
    );

    log::info!("Starting swarm backend on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                config: config.clone(),
                registry: Arc::clone(&registry),
                conversations: Arc::clone(&conversations),
                chat: Arc::clone(&chat),
                metrics: Arc::clone(&metrics),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::chat::config)
            .configure(controllers::agents::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
