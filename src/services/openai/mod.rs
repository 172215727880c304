//! OpenAI advisory integration

pub mod client;

pub use client::OpenAiClient;
