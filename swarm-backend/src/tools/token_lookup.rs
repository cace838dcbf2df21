//! Token symbol resolution for the swap agent
//!
//! Token data is loaded from config/tokens.ron at startup so that swap
//! parameters never depend on a model-produced contract address.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Token info loaded from config
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub decimals: u8,
    pub name: String,
}

/// Known tokens keyed by network name, then by upper-case symbol
#[derive(Debug, Clone, Default)]
pub struct TokenBook {
    networks: HashMap<String, HashMap<String, TokenInfo>>,
}

/// Map an EVM chain id to the network key used in tokens.ron
pub fn network_for_chain(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("mainnet"),
        8453 => Some("base"),
        42161 => Some("arbitrum"),
        _ => None,
    }
}

impl TokenBook {
    /// Load tokens from `<config_dir>/tokens.ron`
    pub fn load(config_dir: &Path) -> Result<Self, String> {
        let tokens_path = config_dir.join("tokens.ron");
        let content = std::fs::read_to_string(&tokens_path)
            .map_err(|e| format!("Failed to read {:?}: {}", tokens_path, e))?;
        let book = Self::from_ron(&content)
            .map_err(|e| format!("Failed to parse {:?}: {}", tokens_path, e))?;

        log::info!(
            "[tokens] Loaded {} tokens across {} networks from {:?}",
            book.len(),
            book.networks.len(),
            tokens_path
        );
        Ok(book)
    }

    pub fn from_ron(content: &str) -> Result<Self, ron::error::SpannedError> {
        let raw: HashMap<String, HashMap<String, TokenInfo>> = ron::from_str(content)?;
        // Normalise symbols so lookups are case-insensitive
        let networks = raw
            .into_iter()
            .map(|(network, tokens)| {
                let tokens = tokens
                    .into_iter()
                    .map(|(symbol, info)| (symbol.to_uppercase(), info))
                    .collect();
                (network.to_lowercase(), tokens)
            })
            .collect();
        Ok(Self { networks })
    }

    pub fn len(&self) -> usize {
        self.networks.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, symbol: &str, network: &str) -> Option<&TokenInfo> {
        self.networks
            .get(&network.to_lowercase())?
            .get(&symbol.trim().to_uppercase())
    }

    pub fn list_available(&self, network: &str) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .networks
            .get(&network.to_lowercase())
            .map(|tokens| tokens.keys().cloned().collect())
            .unwrap_or_default();
        symbols.sort();
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKENS: &str = r#"{
        "base": {
            "ETH": (address: "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE", decimals: 18, name: "Ether"),
            "usdc": (address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", decimals: 6, name: "USD Coin"),
        },
        "Mainnet": {
            "WETH": (address: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", decimals: 18, name: "Wrapped Ether"),
        },
    }"#;

    #[test]
    fn test_case_insensitive_lookup() {
        let book = TokenBook::from_ron(TOKENS).unwrap();
        let a = book.lookup("usdc", "base").unwrap();
        let b = book.lookup("USDC", "BASE").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.decimals, 6);
        assert_eq!(book.lookup("weth", "mainnet").unwrap().name, "Wrapped Ether");
    }

    #[test]
    fn test_no_cross_network_fallback() {
        let book = TokenBook::from_ron(TOKENS).unwrap();
        assert!(book.lookup("WETH", "base").is_none());
        assert!(book.lookup("USDC", "arbitrum").is_none());
    }

    #[test]
    fn test_list_available_sorted() {
        let book = TokenBook::from_ron(TOKENS).unwrap();
        assert_eq!(book.list_available("base"), vec!["ETH", "USDC"]);
        assert!(book.list_available("solana").is_empty());
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn test_load_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tokens.ron"), TOKENS).unwrap();
        let book = TokenBook::load(dir.path()).unwrap();
        assert!(!book.is_empty());

        let empty = tempfile::tempdir().unwrap();
        assert!(TokenBook::load(empty.path()).is_err());
    }

    #[test]
    fn test_network_for_chain() {
        assert_eq!(network_for_chain(1), Some("mainnet"));
        assert_eq!(network_for_chain(8453), Some("base"));
        assert_eq!(network_for_chain(56), None);
    }
}
