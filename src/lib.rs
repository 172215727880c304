//! TradingView signal relay
//!
//! Receives alert webhooks, enriches them with Alpaca market data, consults an
//! advisory language model and places a limit order with the brokerage.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod services;

pub use error::SignalError;
