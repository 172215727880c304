//! Alpaca REST client covering order placement and historical bars

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, Url};
use tracing::{debug, error, info, warn};

use super::messages::{BarsPage, ErrorBody};
use crate::config::AlpacaConfig;
use crate::models::bar::{Bar, BarsRequest};
use crate::models::order::{OrderRequest, OrderResult};
use crate::services::brokerage::{BrokerError, OrderGateway};
use crate::services::market_data::MarketDataProvider;

const KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_HEADER: &str = "APCA-API-SECRET-KEY";
const PAGE_LIMIT: u32 = 10_000;

#[derive(Clone)]
pub struct AlpacaClient {
    client: Client,
    trading_url: String,
    data_url: String,
    api_key: String,
    api_secret: String,
}

impl AlpacaClient {
    pub fn new(config: &AlpacaConfig) -> Self {
        Self::with_client(
            config.trading_base_url(),
            config.data_base_url(),
            &config.api_key,
            &config.api_secret,
            Client::new(),
        )
    }

    pub fn with_client(
        trading_url: impl Into<String>,
        data_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            client,
            trading_url: trim_base(trading_url.into()),
            data_url: trim_base(data_url.into()),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(KEY_HEADER, &self.api_key)
            .header(SECRET_HEADER, &self.api_secret)
    }

    /// `{data}/v2/stocks/{symbol}/bars` with the symbol percent-encoded as a
    /// single path segment
    fn bars_url(&self, symbol: &str) -> Result<Url, BrokerError> {
        let mut url =
            Url::parse(&self.data_url).map_err(|e| BrokerError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| BrokerError::InvalidUrl(self.data_url.clone()))?
            .pop_if_empty()
            .extend(["v2", "stocks", symbol, "bars"]);
        Ok(url)
    }

    async fn bars_page(
        &self,
        request: &BarsRequest,
        page_token: Option<&str>,
    ) -> Result<BarsPage, BrokerError> {
        let url = self.bars_url(&request.symbol)?;
        let limit = PAGE_LIMIT.to_string();
        let start = format_timestamp(&request.start);
        let end = format_timestamp(&request.end);

        let mut query = vec![
            ("timeframe", request.timeframe.as_str()),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("page_token", token));
        }

        let resp = self
            .authorized(self.client.get(url))
            .query(&query)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        resp.json::<BarsPage>()
            .await
            .map_err(|e| BrokerError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for AlpacaClient {
    async fn get_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, BrokerError> {
        let mut bars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.bars_page(request, page_token.as_deref()).await?;
            bars.extend(page.bars.unwrap_or_default());

            match page.next_page_token {
                Some(token) if page_token.as_deref() == Some(token.as_str()) => {
                    warn!(
                        symbol = %request.symbol,
                        page_token = %token,
                        "Alpaca repeated a bars page token, stopping pagination"
                    );
                    break;
                }
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            count = bars.len(),
            "Fetched {} {} bars for {}",
            bars.len(),
            request.timeframe,
            request.symbol
        );
        Ok(bars)
    }
}

#[async_trait]
impl OrderGateway for AlpacaClient {
    async fn create_order(&self, order: &OrderRequest) -> Result<OrderResult, BrokerError> {
        let url = format!("{}/v2/orders", self.trading_url);

        info!(
            symbol = %order.symbol,
            side = %order.side,
            qty = order.qty,
            limit_price = order.limit_price,
            "Placing limit order"
        );

        let resp = self
            .authorized(self.client.post(&url))
            .json(order)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        resp.json::<OrderResult>()
            .await
            .map_err(|e| BrokerError::InvalidResponse(e.to_string()))
    }
}

async fn check_status(resp: Response) -> Result<Response, BrokerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await?;
    error!(status = status.as_u16(), body = %text, "Alpaca request failed");
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.message,
        Err(_) if text.trim().is_empty() => status.to_string(),
        Err(_) => text,
    };

    Err(BrokerError::Api {
        status: status.as_u16(),
        message,
    })
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
