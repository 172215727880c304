//! Environment-backed configuration

use std::env;
use thiserror::Error;

pub const PAPER_TRADING_URL: &str = "https://paper-api.alpaca.markets";
pub const LIVE_TRADING_URL: &str = "https://api.alpaca.markets";
pub const MARKET_DATA_URL: &str = "https://data.alpaca.markets";
pub const OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    pub paper: bool,
    pub trading_url: Option<String>,
    pub data_url: Option<String>,
}

impl AlpacaConfig {
    /// Trading API base URL; an explicit override wins over the paper flag.
    pub fn trading_base_url(&self) -> &str {
        match &self.trading_url {
            Some(url) => url,
            None if self.paper => PAPER_TRADING_URL,
            None => LIVE_TRADING_URL,
        }
    }

    pub fn data_base_url(&self) -> &str {
        self.data_url.as_deref().unwrap_or(MARKET_DATA_URL)
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub alpaca: AlpacaConfig,
    pub openai: OpenAiConfig,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let paper = match optional("ALPACA_PAPER") {
            None => true,
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                name: "ALPACA_PAPER",
                value,
            })?,
        };

        let port = match optional("PORT") {
            None => DEFAULT_PORT,
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
        };

        Ok(Self {
            alpaca: AlpacaConfig {
                api_key: required("ALPACA_API_KEY")?,
                api_secret: required("ALPACA_API_SECRET")?,
                paper,
                trading_url: optional("ALPACA_TRADING_URL"),
                data_url: optional("ALPACA_DATA_URL"),
            },
            openai: OpenAiConfig {
                api_key: required("OPENAI_API_KEY")?,
                base_url: optional("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_URL.to_string()),
                model: optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
            port,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Deployment environment, e.g. `production` or `sandbox`
pub fn get_environment() -> String {
    env::var("ENVIRONMENT")
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|_| "sandbox".to_string())
}
