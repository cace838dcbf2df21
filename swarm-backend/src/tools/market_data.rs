//! Market data sources for the crypto data agent
//!
//! Each source advertises an explicit capability set. The agent only offers
//! the reasoning capability the tools its source actually supports, and the
//! trait's default methods answer `Unsupported` for everything else.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use strum::{AsRefStr, EnumIter};

const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const DEFILLAMA_BASE_URL: &str = "https://api.llama.fi";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MarketCapability {
    Price,
    MarketCap,
    FullyDilutedValuation,
    TotalValueLocked,
    FloorPrice,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketDataError {
    #[error("no match found for '{0}'")]
    NotFound(String),

    #[error("{} is not supported by this data source", .0.as_ref())]
    Unsupported(MarketCapability),

    #[error("market data request failed: {0}")]
    Http(String),

    #[error("unexpected market data response: {0}")]
    Decode(String),
}

/// A resolved value for a coin, protocol or collection
#[derive(Debug, Clone, PartialEq)]
pub struct MarketQuote {
    /// Source-specific identifier (e.g. CoinGecko coin id)
    pub id: String,
    pub name: String,
    pub value: f64,
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn capabilities(&self) -> &[MarketCapability];

    fn supports(&self, capability: MarketCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    async fn price(&self, _coin_name: &str) -> Result<MarketQuote, MarketDataError> {
        Err(MarketDataError::Unsupported(MarketCapability::Price))
    }

    async fn market_cap(&self, _coin_name: &str) -> Result<MarketQuote, MarketDataError> {
        Err(MarketDataError::Unsupported(MarketCapability::MarketCap))
    }

    async fn fully_diluted_valuation(&self, _coin_name: &str) -> Result<MarketQuote, MarketDataError> {
        Err(MarketDataError::Unsupported(MarketCapability::FullyDilutedValuation))
    }

    async fn total_value_locked(&self, _protocol: &str) -> Result<MarketQuote, MarketDataError> {
        Err(MarketDataError::Unsupported(MarketCapability::TotalValueLocked))
    }

    async fn floor_price(&self, _collection: &str) -> Result<MarketQuote, MarketDataError> {
        Err(MarketDataError::Unsupported(MarketCapability::FloorPrice))
    }
}

/// CoinGecko for coins and NFTs, DefiLlama for protocol TVL
pub struct CoinGeckoClient {
    client: Client,
    coingecko_url: String,
    defillama_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(
        api_key: Option<String>,
        coingecko_url: Option<String>,
        defillama_url: Option<String>,
    ) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            coingecko_url: coingecko_url.unwrap_or_else(|| COINGECKO_BASE_URL.to_string()),
            defillama_url: defillama_url.unwrap_or_else(|| DEFILLAMA_BASE_URL.to_string()),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// GET a JSON body. A 404 is reported as `NotFound(subject)`, the name
    /// the user asked about.
    async fn get_json(&self, url: &str, query: &[(&str, &str)], subject: &str) -> Result<Value, MarketDataError> {
        let mut request = self.client.get(url).query(query);
        if let Some(ref key) = self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MarketDataError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::NotFound(subject.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Http(format!("{}: {}", status, body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| MarketDataError::Decode(e.to_string()))
    }

    async fn search(&self, query: &str, section: &str) -> Result<(String, String), MarketDataError> {
        let url = format!("{}/search", self.coingecko_url);
        let body = self.get_json(&url, &[("query", query)], query).await?;
        first_search_hit(&body, section).ok_or_else(|| MarketDataError::NotFound(query.to_string()))
    }

    async fn coin_market_field(&self, coin_name: &str, field: &str) -> Result<MarketQuote, MarketDataError> {
        let (id, name) = self.search(coin_name, "coins").await?;
        let url = format!("{}/coins/{}", self.coingecko_url, id);
        let body = self
            .get_json(
                &url,
                &[
                    ("localization", "false"),
                    ("tickers", "false"),
                    ("community_data", "false"),
                    ("developer_data", "false"),
                ],
                coin_name,
            )
            .await?;

        let value = body
            .pointer(&format!("/market_data/{}/usd", field))
            .and_then(|v| v.as_f64())
            .ok_or_else(|| MarketDataError::Decode(format!("missing market_data.{} for {}", field, id)))?;

        Ok(MarketQuote { id, name, value })
    }
}

/// Pick the top hit `(id, name)` from a CoinGecko `/search` body
fn first_search_hit(body: &Value, section: &str) -> Option<(String, String)> {
    let hit = body.get(section)?.as_array()?.first()?;
    let id = hit.get("id")?.as_str()?.to_string();
    let name = hit
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or(&id)
        .to_string();
    Some((id, name))
}

/// DefiLlama protocol slug: lowercase, whitespace collapsed to dashes
fn protocol_slug(protocol: &str) -> String {
    protocol
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    fn capabilities(&self) -> &[MarketCapability] {
        &[
            MarketCapability::Price,
            MarketCapability::MarketCap,
            MarketCapability::FullyDilutedValuation,
            MarketCapability::TotalValueLocked,
            MarketCapability::FloorPrice,
        ]
    }

    async fn price(&self, coin_name: &str) -> Result<MarketQuote, MarketDataError> {
        let (id, name) = self.search(coin_name, "coins").await?;
        let url = format!("{}/simple/price", self.coingecko_url);
        let body = self
            .get_json(&url, &[("ids", id.as_str()), ("vs_currencies", "usd")], coin_name)
            .await?;

        let value = body
            .pointer(&format!("/{}/usd", id))
            .and_then(|v| v.as_f64())
            .ok_or_else(|| MarketDataError::NotFound(coin_name.to_string()))?;

        log::info!("[MARKET_DATA] Price for {} ({}): {}", name, id, value);
        Ok(MarketQuote { id, name, value })
    }

    async fn market_cap(&self, coin_name: &str) -> Result<MarketQuote, MarketDataError> {
        self.coin_market_field(coin_name, "market_cap").await
    }

    async fn fully_diluted_valuation(&self, coin_name: &str) -> Result<MarketQuote, MarketDataError> {
        self.coin_market_field(coin_name, "fully_diluted_valuation").await
    }

    async fn total_value_locked(&self, protocol: &str) -> Result<MarketQuote, MarketDataError> {
        let slug = protocol_slug(protocol);
        let url = format!("{}/tvl/{}", self.defillama_url, slug);
        let body = self.get_json(&url, &[], protocol).await?;

        let value = body
            .as_f64()
            .ok_or_else(|| MarketDataError::NotFound(protocol.to_string()))?;

        Ok(MarketQuote {
            id: slug,
            name: protocol.to_string(),
            value,
        })
    }

    async fn floor_price(&self, collection: &str) -> Result<MarketQuote, MarketDataError> {
        let (id, name) = self.search(collection, "nfts").await?;
        let url = format!("{}/nfts/{}", self.coingecko_url, id);
        let body = self.get_json(&url, &[], collection).await?;

        let value = body
            .pointer("/floor_price/usd")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| MarketDataError::Decode(format!("missing floor_price for {}", id)))?;

        Ok(MarketQuote { id, name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct PriceOnly;

    #[async_trait]
    impl MarketDataSource for PriceOnly {
        fn capabilities(&self) -> &[MarketCapability] {
            &[MarketCapability::Price]
        }

        async fn price(&self, coin_name: &str) -> Result<MarketQuote, MarketDataError> {
            Ok(MarketQuote {
                id: coin_name.to_lowercase(),
                name: coin_name.to_string(),
                value: 1.0,
            })
        }
    }

    #[test]
    fn test_first_search_hit() {
        let body = json!({
            "coins": [
                {"id": "bitcoin", "name": "Bitcoin", "symbol": "BTC"},
                {"id": "wrapped-bitcoin", "name": "Wrapped Bitcoin"}
            ],
            "nfts": []
        });
        assert_eq!(
            first_search_hit(&body, "coins"),
            Some(("bitcoin".to_string(), "Bitcoin".to_string()))
        );
        assert_eq!(first_search_hit(&body, "nfts"), None);
        assert_eq!(first_search_hit(&body, "exchanges"), None);
    }

    #[test]
    fn test_protocol_slug() {
        assert_eq!(protocol_slug("Uniswap"), "uniswap");
        assert_eq!(protocol_slug("  Lido   Finance "), "lido-finance");
    }

    #[tokio::test]
    async fn test_unsupported_capability_defaults() {
        let source = PriceOnly;
        assert!(source.supports(MarketCapability::Price));
        assert!(!source.supports(MarketCapability::FloorPrice));

        let err = source.floor_price("milady").await.unwrap_err();
        assert!(matches!(err, MarketDataError::Unsupported(MarketCapability::FloorPrice)));
        assert_eq!(source.price("ETH").await.unwrap().id, "eth");
    }

    #[tokio::test]
    async fn test_not_found_names_the_query_not_the_url() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/search"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let client = CoinGeckoClient::new(None, Some(server.uri()), Some(server.uri())).unwrap();

        let err = client.price("pepe").await.unwrap_err();
        assert!(matches!(err, MarketDataError::NotFound(ref name) if name == "pepe"));

        let err = client.total_value_locked("Lido Finance").await.unwrap_err();
        match err {
            MarketDataError::NotFound(name) => {
                assert_eq!(name, "Lido Finance");
                assert!(!name.contains(&server.uri()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_capability_names() {
        assert_eq!(MarketCapability::FullyDilutedValuation.as_ref(), "fully_diluted_valuation");
        assert_eq!(
            MarketDataError::Unsupported(MarketCapability::TotalValueLocked).to_string(),
            "total_value_locked is not supported by this data source"
        );
    }
}
