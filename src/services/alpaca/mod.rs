//! Alpaca brokerage integration

pub mod client;
pub mod messages;

pub use client::AlpacaClient;
