pub mod market_data;
pub mod token_lookup;
pub mod types;

pub use market_data::{CoinGeckoClient, MarketCapability, MarketDataError, MarketDataSource};
pub use token_lookup::{TokenBook, TokenInfo};
pub use types::{PropertySchema, ToolDefinition, ToolInputSchema};
