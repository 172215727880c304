//! Market data provider interface.

use async_trait::async_trait;

use crate::models::bar::{Bar, BarsRequest};
use crate::services::brokerage::BrokerError;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Get historical bars for a symbol within `[start, end]`, oldest first
    async fn get_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, BrokerError>;
}
