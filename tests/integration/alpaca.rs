//! Integration tests for the Alpaca REST client.

use chrono::{TimeZone, Utc};
use serde_json::json;
use signal_relay::models::bar::{BarsRequest, Timeframe};
use signal_relay::models::signal::{OrderSide, TradeSignal};
use signal_relay::pipeline::{build_order, fetch_candles};
use signal_relay::services::alpaca::AlpacaClient;
use signal_relay::services::brokerage::{BrokerError, OrderGateway};
use signal_relay::services::market_data::MarketDataProvider;
use wiremock::matchers::{
    body_json, header, method, path, path_regex, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AlpacaClient {
    AlpacaClient::with_client(
        server.uri(),
        server.uri(),
        "test-key",
        "test-secret",
        reqwest::Client::new(),
    )
}

fn bar_json(t: &str, close: f64) -> serde_json::Value {
    json!({ "t": t, "o": 150.1, "h": 151.0, "l": 149.8, "c": close, "v": 1200, "n": 31, "vw": 150.4 })
}

fn five_minute_request() -> BarsRequest {
    five_minute_request_for("AAPL")
}

fn five_minute_request_for(symbol: &str) -> BarsRequest {
    BarsRequest {
        symbol: symbol.to_string(),
        timeframe: Timeframe::FiveMinutes,
        start: Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 3, 4, 15, 42, 7).unwrap(),
    }
}

#[tokio::test]
async fn create_order_posts_limit_gtc_body_with_credentials() {
    let server = MockServer::start().await;
    let accepted = json!({ "id": "904837e3", "status": "accepted", "symbol": "AAPL" });

    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .and(header("APCA-API-KEY-ID", "test-key"))
        .and(header("APCA-API-SECRET-KEY", "test-secret"))
        .and(body_json(json!({
            "symbol": "AAPL",
            "qty": 10.0,
            "side": "buy",
            "type": "limit",
            "time_in_force": "gtc",
            "limit_price": 150.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let order = build_order(&TradeSignal {
        symbol: "AAPL".to_string(),
        qty: 10.0,
        side: OrderSide::Buy,
        limit_price: 150.0,
    });
    let result = client_for(&server).create_order(&order).await.unwrap();

    assert_eq!(result, accepted);
}

#[tokio::test]
async fn rejected_order_surfaces_alpaca_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": 40310000,
            "message": "insufficient buying power"
        })))
        .mount(&server)
        .await;

    let order = build_order(&TradeSignal {
        symbol: "AAPL".to_string(),
        qty: 10_000.0,
        side: OrderSide::Buy,
        limit_price: 150.0,
    });
    let err = client_for(&server).create_order(&order).await.unwrap_err();

    match &err {
        BrokerError::Api { status, message } => {
            assert_eq!(*status, 403);
            assert_eq!(message, "insufficient buying power");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "insufficient buying power");
}

#[tokio::test]
async fn non_json_error_body_is_kept_as_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let order = build_order(&TradeSignal {
        symbol: "AAPL".to_string(),
        qty: 1.0,
        side: OrderSide::Sell,
        limit_price: 150.0,
    });
    let err = client_for(&server).create_order(&order).await.unwrap_err();

    assert_eq!(err.to_string(), "upstream unavailable");
}

#[tokio::test]
async fn get_bars_sends_window_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/AAPL/bars"))
        .and(header("APCA-API-KEY-ID", "test-key"))
        .and(query_param("timeframe", "5Min"))
        .and(query_param("start", "2024-03-04T00:00:00.000Z"))
        .and(query_param("end", "2024-03-04T15:42:07.000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": [
                bar_json("2024-03-04T14:30:00Z", 150.5),
                bar_json("2024-03-04T14:35:00Z", 150.9)
            ],
            "symbol": "AAPL",
            "next_page_token": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bars = client_for(&server)
        .get_bars(&five_minute_request())
        .await
        .unwrap();

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].close, 150.5);
    assert_eq!(bars[1].close, 150.9);
    assert_eq!(bars[0].trade_count, Some(31));
    assert_eq!(bars[0].volume, 1200.0);
}

#[tokio::test]
async fn get_bars_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/AAPL/bars"))
        .and(query_param_is_missing("page_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": [bar_json("2024-03-04T14:30:00Z", 150.5)],
            "symbol": "AAPL",
            "next_page_token": "QUFQTHxNfDIwMjQtMDMtMDRUMTQ6MzU6MDBa"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/AAPL/bars"))
        .and(query_param("page_token", "QUFQTHxNfDIwMjQtMDMtMDRUMTQ6MzU6MDBa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": [bar_json("2024-03-04T14:35:00Z", 150.9)],
            "symbol": "AAPL",
            "next_page_token": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bars = client_for(&server)
        .get_bars(&five_minute_request())
        .await
        .unwrap();

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![150.5, 150.9]);
}

#[tokio::test]
async fn repeated_page_token_stops_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/AAPL/bars"))
        .and(query_param_is_missing("page_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": [bar_json("2024-03-04T14:30:00Z", 150.5)],
            "symbol": "AAPL",
            "next_page_token": "t1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/AAPL/bars"))
        .and(query_param("page_token", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": [bar_json("2024-03-04T14:35:00Z", 150.9)],
            "symbol": "AAPL",
            "next_page_token": "t1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bars = client_for(&server)
        .get_bars(&five_minute_request())
        .await
        .unwrap();

    assert_eq!(bars.len(), 2);
}

#[tokio::test]
async fn symbol_with_slash_is_one_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/BRK%2FB/bars"))
        .and(query_param("timeframe", "5Min"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": [bar_json("2024-03-04T14:30:00Z", 410.2)],
            "symbol": "BRK/B",
            "next_page_token": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bars = client_for(&server)
        .get_bars(&five_minute_request_for("BRK/B"))
        .await
        .unwrap();

    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].close, 410.2);
}

#[tokio::test]
async fn symbol_cannot_rewrite_path_or_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/AAPL/bars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": [bar_json("2024-03-04T14:30:00Z", 150.5)],
            "symbol": "AAPL",
            "next_page_token": null
        })))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/stocks/[^/]+/bars$"))
        .and(query_param("timeframe", "5Min"))
        .and(query_param_is_missing("x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": [],
            "symbol": "AAPL/bars?x=1#",
            "next_page_token": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bars = client_for(&server)
        .get_bars(&five_minute_request_for("AAPL/bars?x=1#"))
        .await
        .unwrap();

    assert!(bars.is_empty());
}

#[tokio::test]
async fn null_bars_is_an_empty_window() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/AAPL/bars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": null,
            "symbol": "AAPL",
            "next_page_token": null
        })))
        .mount(&server)
        .await;

    let bars = client_for(&server)
        .get_bars(&five_minute_request())
        .await
        .unwrap();

    assert!(bars.is_empty());
}

#[tokio::test]
async fn fetch_candles_requests_both_timeframes() {
    let server = MockServer::start().await;

    for timeframe in ["5Min", "4Hour"] {
        Mock::given(method("GET"))
            .and(path("/v2/stocks/AAPL/bars"))
            .and(query_param("timeframe", timeframe))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bars": [bar_json("2024-03-04T12:00:00Z", 150.0)],
                "symbol": "AAPL",
                "next_page_token": null
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let now = Utc.with_ymd_and_hms(2024, 3, 4, 15, 42, 7).unwrap();
    let candles = fetch_candles(&client, "AAPL", now).await.unwrap();

    assert_eq!(candles.five_min.len(), 1);
    assert_eq!(candles.four_hour.len(), 1);
}

#[tokio::test]
async fn market_data_error_fails_candle_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/AAPL/bars"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "subscription does not permit querying recent SIP data"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = fetch_candles(&client, "AAPL", Utc::now()).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to fetch candles");
    assert_eq!(
        err.0.to_string(),
        "subscription does not permit querying recent SIP data"
    );
}
