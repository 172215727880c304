//! Failure taxonomy of the signal pipeline

use thiserror::Error;

use crate::pipeline::candles::FetchCandlesError;
use crate::services::advisory::AdvisoryError;
use crate::services::brokerage::BrokerError;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error(transparent)]
    Candles(#[from] FetchCandlesError),

    #[error(transparent)]
    Advisory(#[from] AdvisoryError),

    #[error(transparent)]
    Order(BrokerError),
}

impl SignalError {
    /// Pipeline stage that produced the error, used for logs and metrics
    pub fn stage(&self) -> &'static str {
        match self {
            SignalError::Candles(_) => "candles",
            SignalError::Advisory(_) => "advisory",
            SignalError::Order(_) => "order",
        }
    }
}
