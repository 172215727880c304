//! Candle retrieval for an incoming signal

use chrono::{DateTime, Duration, NaiveTime, Utc};
use thiserror::Error;

use crate::models::bar::{BarsRequest, CandleWindow, Candles, Timeframe};
use crate::services::brokerage::BrokerError;
use crate::services::market_data::MarketDataProvider;

pub const LOOKBACK_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
#[error("Failed to fetch candles")]
pub struct FetchCandlesError(#[source] pub BrokerError);

/// Today's session so far: UTC midnight up to `now`
pub fn five_minute_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (midnight, now)
}

/// The trailing week up to `now`
pub fn four_hour_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::seconds(LOOKBACK_SECONDS), now)
}

fn bars_request(
    symbol: &str,
    timeframe: Timeframe,
    window: (DateTime<Utc>, DateTime<Utc>),
) -> BarsRequest {
    BarsRequest {
        symbol: symbol.to_string(),
        timeframe,
        start: window.0,
        end: window.1,
    }
}

/// Fetch the 5-minute and 4-hour windows for `symbol`.
///
/// Both requests are in flight together; if either fails nothing is returned.
pub async fn fetch_candles(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<Candles, FetchCandlesError> {
    let five_min_request = bars_request(symbol, Timeframe::FiveMinutes, five_minute_window(now));
    let four_hour_request = bars_request(symbol, Timeframe::FourHours, four_hour_window(now));

    let (five_min_bars, four_hour_bars) = tokio::try_join!(
        provider.get_bars(&five_min_request),
        provider.get_bars(&four_hour_request),
    )
    .map_err(FetchCandlesError)?;

    Ok(Candles {
        four_hour: CandleWindow {
            timeframe: four_hour_request.timeframe,
            start: four_hour_request.start,
            end: four_hour_request.end,
            bars: four_hour_bars,
        },
        five_min: CandleWindow {
            timeframe: five_min_request.timeframe,
            start: five_min_request.start,
            end: five_min_request.end,
            bars: five_min_bars,
        },
    })
}
