//! External collaborators: brokerage, market data and advisory model.

pub mod advisory;
pub mod alpaca;
pub mod brokerage;
pub mod market_data;
pub mod openai;

pub use advisory::{AdvisoryError, AdvisoryService};
pub use alpaca::AlpacaClient;
pub use brokerage::{BrokerError, OrderGateway};
pub use market_data::MarketDataProvider;
pub use openai::OpenAiClient;
