//! Signal processing: candles, advisory consultation, order submission

pub mod candles;
pub mod order;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::SignalError;
use crate::models::order::OrderResult;
use crate::models::signal::TradeSignal;
use crate::services::advisory::{request_advice, AdvisoryService};
use crate::services::brokerage::OrderGateway;
use crate::services::market_data::MarketDataProvider;

pub use candles::{fetch_candles, FetchCandlesError};
pub use order::build_order;

/// Collaborators shared by every request, built once at startup
#[derive(Clone)]
pub struct SignalPipeline {
    market_data: Arc<dyn MarketDataProvider>,
    broker: Arc<dyn OrderGateway>,
    advisor: Arc<dyn AdvisoryService>,
}

impl SignalPipeline {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        broker: Arc<dyn OrderGateway>,
        advisor: Arc<dyn AdvisoryService>,
    ) -> Self {
        Self {
            market_data,
            broker,
            advisor,
        }
    }

    pub async fn execute(&self, signal: &TradeSignal) -> Result<OrderResult, SignalError> {
        self.execute_at(signal, Utc::now()).await
    }

    /// Run the pipeline with `now` as the reference instant for candle windows.
    ///
    /// Each step runs only after the previous one succeeded. Nothing is undone
    /// when a later step fails.
    pub async fn execute_at(
        &self,
        signal: &TradeSignal,
        now: DateTime<Utc>,
    ) -> Result<OrderResult, SignalError> {
        let candles = fetch_candles(self.market_data.as_ref(), &signal.symbol, now).await?;
        debug!(
            symbol = %signal.symbol,
            five_min = candles.five_min.len(),
            four_hour = candles.four_hour.len(),
            "Fetched candles for {}",
            signal.symbol
        );

        // Advisory output does not gate the order yet.
        let advice = request_advice(self.advisor.as_ref(), signal).await?;
        debug!(symbol = %signal.symbol, advice = %advice, "Advisory consulted");

        let order = build_order(signal);
        let result = self
            .broker
            .create_order(&order)
            .await
            .map_err(SignalError::Order)?;

        info!(
            symbol = %order.symbol,
            side = %order.side,
            qty = order.qty,
            limit_price = order.limit_price,
            "Order submitted for {}",
            order.symbol
        );
        Ok(result)
    }
}
