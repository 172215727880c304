//! Brokerage interface for order placement.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::order::{OrderRequest, OrderResult};

/// Failures talking to the brokerage, for both trading and market data calls
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; `message` is the brokerage's own description
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit an order and return the brokerage's response verbatim
    async fn create_order(&self, order: &OrderRequest) -> Result<OrderResult, BrokerError>;
}
