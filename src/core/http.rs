//! HTTP endpoint server using Axum

use axum::{
    body::Bytes,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::config::Config;
use crate::error::SignalError;
use crate::metrics::Metrics;
use crate::models::signal::validate_signal;
use crate::pipeline::SignalPipeline;
use crate::services::alpaca::AlpacaClient;
use crate::services::openai::OpenAiClient;

pub const SIGNAL_ROUTE: &str = "/tradingview-signal";

const SERVICE_NAME: &str = "signal-relay";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SignalPipeline>,
    pub metrics: Arc<Metrics>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pipeline: SignalPipeline, metrics: Arc<Metrics>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metrics,
            start_time: Instant::now(),
        }
    }
}

/// Liveness only; collaborators are not contacted
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.start_time.elapsed().as_secs()
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.export().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Count and time each routed request under its route template
async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    state.metrics.http_requests_in_flight.dec();

    let status = response.status();
    let elapsed = start.elapsed();
    state
        .metrics
        .record_request(&method, &route, status.as_u16(), elapsed.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            route = %route,
            status = %status,
            duration_ms = elapsed.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Open a trade from a TradingView alert
async fn tradingview_signal(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    state.metrics.signals_received_total.inc();

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected signal with malformed JSON body");
            state.metrics.record_failure("validation");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Invalid signal payload", "error": e.to_string() })),
            );
        }
    };

    let signal = match validate_signal(&payload) {
        Ok(signal) => signal,
        Err(errors) => {
            warn!(errors = ?errors, "Rejected invalid trade signal");
            state.metrics.record_failure("validation");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "Invalid trade signal", "errors": errors })),
            );
        }
    };

    info!(
        symbol = %signal.symbol,
        side = %signal.side,
        qty = signal.qty,
        limit_price = signal.limit_price,
        "Received trade signal for {}",
        signal.symbol
    );

    match state.pipeline.execute(&signal).await {
        Ok(order) => {
            state.metrics.orders_submitted_total.inc();
            (
                StatusCode::OK,
                Json(json!({ "message": "Trade opened successfully", "order": order })),
            )
        }
        Err(e) => {
            log_failure(&signal.symbol, &e);
            state.metrics.record_failure(e.stage());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to open trade", "error": e.to_string() })),
            )
        }
    }
}

fn log_failure(symbol: &str, err: &SignalError) {
    match err {
        SignalError::Candles(fetch) => error!(
            symbol = %symbol,
            stage = err.stage(),
            error = %err,
            cause = %fetch.0,
            "Signal pipeline failed"
        ),
        _ => error!(symbol = %symbol, stage = err.stage(), error = %err, "Signal pipeline failed"),
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route(SIGNAL_ROUTE, post(tradingview_signal))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish once `shutdown` fires.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Build the collaborators from `config` and serve on all interfaces until
/// `shutdown` resolves. Bind and serve failures are returned to the caller.
pub async fn start_server<F>(
    config: Config,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics = Arc::new(Metrics::new()?);

    let alpaca = Arc::new(AlpacaClient::new(&config.alpaca));
    let openai = Arc::new(OpenAiClient::new(&config.openai));
    info!(
        paper = config.alpaca.paper,
        trading_url = config.alpaca.trading_base_url(),
        model = openai.model(),
        "Collaborator clients initialized"
    );

    let pipeline = SignalPipeline::new(alpaca.clone(), alpaca, openai);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "HTTP server listening on port {}", config.port);
    serve(listener, AppState::new(pipeline, metrics), shutdown).await?;

    info!("HTTP server stopped");
    Ok(())
}
