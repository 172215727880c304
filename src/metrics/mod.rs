//! Prometheus metrics for the relay

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    /// Labelled by method, matched route and status code
    pub http_requests_total: IntCounterVec,
    /// Labelled by matched route
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: IntGauge,
    pub signals_received_total: IntCounter,
    pub orders_submitted_total: IntCounter,
    /// Failed signals, labelled by the pipeline stage that failed
    pub signal_failures_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["path"],
        )?;
        let http_requests_in_flight = IntGauge::new(
            "http_requests_in_flight",
            "Number of HTTP requests currently being served",
        )?;
        let signals_received_total =
            IntCounter::new("signals_received_total", "Trade signals received")?;
        let orders_submitted_total =
            IntCounter::new("orders_submitted_total", "Orders accepted by the brokerage")?;
        let signal_failures_total = IntCounterVec::new(
            Opts::new("signal_failures_total", "Trade signals that failed"),
            &["stage"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(signals_received_total.clone()))?;
        registry.register(Box::new(orders_submitted_total.clone()))?;
        registry.register(Box::new(signal_failures_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            signals_received_total,
            orders_submitted_total,
            signal_failures_total,
        })
    }

    pub fn record_request(&self, method: &str, path: &str, status: u16, seconds: f64) {
        self.http_requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[path])
            .observe(seconds);
    }

    pub fn record_failure(&self, stage: &str) {
        self.signal_failures_total.with_label_values(&[stage]).inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
