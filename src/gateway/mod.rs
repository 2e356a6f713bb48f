//! Data gateway - live backend with synthetic fallback
//!
//! Every request first tries the backend found by [`ConnectionProbe`]. Any
//! failure on the live path (no endpoint, bad status, timeout, malformed
//! payload) degrades that one request to locally generated data tagged
//! [`Provenance::Synthetic`](crate::types::Provenance). Failures other than
//! "no endpoint" also drop the cached endpoint so the next request re-probes.
//! Nothing on this surface returns an error.

mod error;
mod probe;
mod transport;
mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{GatewayError, GatewayResult};
pub use probe::ConnectionProbe;
pub use transport::{HttpTransport, Query, RemoteCall};
pub use wire::parse_timestamp;

use reqwest::Url;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{AppConfig, GatewayConfig};
use crate::simulator::SeriesSimulator;
use crate::stats;
use crate::types::{AuthCheck, AuthStatus, CorrelationReport, Sourced, StockSeries};
use wire::{WireCorrelation, WireSeries, WireSymbols};

/// Symbols used for a correlation request that names none
pub const DEFAULT_CORRELATION_SYMBOL_COUNT: usize = 6;

pub struct DataGateway {
    probe: ConnectionProbe,
    transport: Arc<dyn RemoteCall>,
    simulator: SeriesSimulator,
    request_timeout: Duration,
    default_symbols: Vec<String>,
}

impl DataGateway {
    /// Gateway over HTTP with the configured candidates and generator
    pub fn from_config(config: &AppConfig) -> Self {
        let transport: Arc<dyn RemoteCall> = Arc::new(HttpTransport::new());
        Self::with_transport(
            transport,
            &config.gateway,
            SeriesSimulator::new(config.simulator.strategy),
        )
    }

    pub fn with_transport(
        transport: Arc<dyn RemoteCall>,
        config: &GatewayConfig,
        simulator: SeriesSimulator,
    ) -> Self {
        let probe = ConnectionProbe::new(
            transport.clone(),
            config.candidates.clone(),
            Duration::from_millis(config.probe_timeout_ms),
        );

        Self {
            probe,
            transport,
            simulator,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            default_symbols: config.default_symbols.clone(),
        }
    }

    /// Shared handle to the endpoint cache
    pub fn probe(&self) -> &ConnectionProbe {
        &self.probe
    }

    pub fn simulator(&self) -> &SeriesSimulator {
        &self.simulator
    }

    /// True when some candidate endpoint answers its health check
    pub async fn health(&self) -> bool {
        self.probe.discover().await.is_some()
    }

    pub async fn is_connected(&self) -> bool {
        self.probe.is_connected().await
    }

    pub async fn active_endpoint(&self) -> Option<String> {
        self.probe.active_endpoint().await
    }

    /// Forget the cached endpoint so the next request sweeps all candidates
    pub async fn reset_connection(&self) {
        self.probe.reset().await;
    }

    /// Symbols offered by the backend, or the default list
    pub async fn available_symbols(&self) -> Sourced<Vec<String>> {
        let live = self
            .fetch::<WireSymbols>("/api/stocks", Vec::new())
            .await
            .and_then(WireSymbols::into_symbols);

        self.settle("/api/stocks", live, || self.default_symbols.clone())
            .await
    }

    /// Price series for one symbol over the last `minutes`
    pub async fn series_for(&self, symbol: &str, minutes: usize) -> Sourced<StockSeries> {
        let path = stock_path(symbol);
        let live = self
            .fetch::<WireSeries>(&path, vec![("minutes", minutes.to_string())])
            .await
            .and_then(|wire| wire.into_stock_series(symbol, minutes));

        self.settle(&path, live, || {
            let series = self.simulator.generate(symbol, minutes);
            let average = stats::descriptive_stats(&series.prices()).average;
            StockSeries::new(series, average, minutes)
        })
        .await
    }

    /// Correlation matrix and per-symbol statistics
    ///
    /// Duplicate symbols are dropped (first occurrence wins); an empty list
    /// is replaced by the first six default symbols.
    pub async fn correlation_matrix(
        &self,
        symbols: &[String],
        minutes: usize,
    ) -> Sourced<CorrelationReport> {
        let symbols = self.normalize_symbols(symbols);

        let mut query: Query = vec![("minutes", minutes.to_string())];
        query.extend(symbols.iter().map(|s| ("symbols", s.clone())));

        let live = self
            .fetch::<WireCorrelation>("/api/correlation", query)
            .await
            .and_then(|wire| wire.into_report(minutes));

        self.settle("/api/correlation", live, || {
            let prices: Vec<(String, Vec<f64>)> = symbols
                .iter()
                .map(|symbol| {
                    let series = self.simulator.generate(symbol, minutes);
                    (symbol.clone(), series.prices())
                })
                .collect();
            stats::build_report(&prices, minutes)
        })
        .await
    }

    /// Backend authentication state
    pub async fn auth_status(&self) -> Sourced<AuthStatus> {
        let live = self.fetch::<AuthStatus>("/api/auth/status", Vec::new()).await;
        self.settle("/api/auth/status", live, AuthStatus::offline)
            .await
    }

    /// Ask the backend to re-authenticate against its upstream
    pub async fn test_authentication(&self) -> Sourced<AuthCheck> {
        let live = self.fetch::<AuthCheck>("/api/test-auth", Vec::new()).await;
        self.settle("/api/test-auth", live, AuthCheck::offline).await
    }

    fn normalize_symbols(&self, symbols: &[String]) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.trim();
            if !symbol.is_empty() && !unique.iter().any(|s| s == symbol) {
                unique.push(symbol.to_string());
            }
        }

        if unique.is_empty() {
            unique = self
                .default_symbols
                .iter()
                .take(DEFAULT_CORRELATION_SYMBOL_COUNT)
                .cloned()
                .collect();
        }
        unique
    }

    /// One live GET against the active endpoint, decoded into `T`
    async fn fetch<T: DeserializeOwned>(&self, path: &str, query: Query) -> GatewayResult<T> {
        let base = self.probe.discover().await.ok_or(GatewayError::NoEndpoint)?;

        let value = self
            .transport
            .get_json(&base, path, &query, self.request_timeout)
            .await?;

        serde_json::from_value(value).map_err(|source| GatewayError::Decode {
            url: format!("{}{}", base, path),
            source,
        })
    }

    /// Tag a live result, or invalidate and substitute the fallback
    async fn settle<T>(
        &self,
        path: &str,
        live: GatewayResult<T>,
        fallback: impl FnOnce() -> T,
    ) -> Sourced<T> {
        match live {
            Ok(data) => {
                debug!(path = %path, "Live response");
                Sourced::live(data)
            }
            Err(e) => {
                if e.invalidates_endpoint() {
                    warn!(path = %path, error = %e, "API call failed, using synthetic data");
                    self.probe.invalidate().await;
                } else {
                    debug!(path = %path, "No backend, using synthetic data");
                }
                Sourced::synthetic(fallback())
            }
        }
    }
}

/// `/api/stocks/{symbol}` with the symbol encoded as a single path segment
fn stock_path(symbol: &str) -> String {
    Url::parse("http://backend/api/stocks")
        .map(|mut url| {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.push(symbol);
            }
            url.path().to_string()
        })
        .unwrap_or_else(|_| format!("/api/stocks/{}", symbol))
}

impl std::fmt::Debug for DataGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataGateway")
            .field("probe", &self.probe)
            .field("simulator", &self.simulator)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulationStrategy;
    use crate::types::Provenance;
    use serde_json::json;
    use super::testing::{Scripted, ScriptedTransport};

    const BASE: &str = "http://localhost:5000";

    fn gateway(transport: ScriptedTransport) -> (DataGateway, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let config = GatewayConfig {
            candidates: vec![BASE.to_string()],
            ..GatewayConfig::default()
        };
        let gateway = DataGateway::with_transport(
            transport.clone(),
            &config,
            SeriesSimulator::new(SimulationStrategy::RandomWalk),
        );
        (gateway, transport)
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn offline_series_is_synthetic() {
        let (gateway, _) = gateway(ScriptedTransport::new());

        let response = gateway.series_for("AAPL", 30).await;
        assert_eq!(response.provenance, Provenance::Synthetic);
        assert_eq!(response.data.count, 30);
        let expected = stats::mean(&response.data.series.prices());
        assert!((response.data.average - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn live_series_is_tagged_live() {
        let (gateway, transport) = gateway(ScriptedTransport::new().healthy(BASE).respond(
            "/api/stocks/AAPL",
            Scripted::Json(json!({
                "symbol": "AAPL",
                "data": [
                    {"timestamp": "2024-05-01T14:00:00Z", "price": 175.0, "time": "14:00"},
                    {"timestamp": "2024-05-01T14:01:00Z", "price": 176.0, "time": "14:01"}
                ],
                "average": 175.5,
                "count": 2,
                "timeRange": 30
            })),
        ));

        let response = gateway.series_for("AAPL", 30).await;
        assert!(response.is_live());
        assert_eq!(response.data.average, 175.5);

        let requests = transport.requests();
        assert_eq!(requests[0].0, "/api/stocks/AAPL");
        assert_eq!(
            requests[0].1,
            vec![("minutes".to_string(), "30".to_string())]
        );
    }

    #[test]
    fn stock_path_encodes_symbol() {
        assert_eq!(stock_path("AAPL"), "/api/stocks/AAPL");
        assert_eq!(stock_path("BRK/B"), "/api/stocks/BRK%2FB");
        assert_eq!(stock_path("A?B"), "/api/stocks/A%3FB");
    }

    #[tokio::test]
    async fn slashed_symbol_stays_one_segment() {
        let (gateway, transport) = gateway(ScriptedTransport::new().healthy(BASE).respond(
            "/api/stocks/BRK%2FB",
            Scripted::Json(json!({
                "symbol": "BRK/B",
                "data": [{"timestamp": "2024-05-01T14:00:00Z", "price": 410.0}]
            })),
        ));

        let response = gateway.series_for("BRK/B", 30).await;
        assert!(response.is_live());
        assert_eq!(response.data.series.symbol, "BRK/B");
        assert_eq!(transport.requests()[0].0, "/api/stocks/BRK%2FB");
    }

    #[tokio::test]
    async fn zero_minutes_keeps_endpoint() {
        let (gateway, transport) = gateway(ScriptedTransport::new().healthy(BASE).respond(
            "/api/stocks/AAPL",
            Scripted::Json(json!({
                "data": [{"timestamp": "2024-05-01T14:00:00Z", "price": 175.0}]
            })),
        ));

        let response = gateway.series_for("AAPL", 0).await;
        assert!(response.is_live());
        assert!(response.data.series.is_empty());
        assert!(gateway.is_connected().await);

        gateway.series_for("AAPL", 0).await;
        assert_eq!(transport.health_calls(BASE), 1);
    }

    #[tokio::test]
    async fn malformed_payload_falls_back_and_invalidates() {
        let (gateway, transport) = gateway(
            ScriptedTransport::new()
                .healthy(BASE)
                .respond("/api/stocks/MSFT", Scripted::Raw("{\"data\": [")),
        );

        let response = gateway.series_for("MSFT", 15).await;
        assert_eq!(response.provenance, Provenance::Synthetic);
        assert_eq!(response.data.count, 15);
        assert!(!gateway.is_connected().await);

        // The next request sweeps again
        gateway.series_for("MSFT", 15).await;
        assert_eq!(transport.health_calls(BASE), 2);
    }

    #[tokio::test]
    async fn error_status_and_timeout_fall_back() {
        let (gateway, _) = gateway(
            ScriptedTransport::new()
                .healthy(BASE)
                .respond("/api/stocks", Scripted::Status(500))
                .respond("/api/auth/status", Scripted::Timeout),
        );

        let stocks = gateway.available_symbols().await;
        assert_eq!(stocks.provenance, Provenance::Synthetic);
        assert_eq!(stocks.data.len(), 8);

        let auth = gateway.auth_status().await;
        assert_eq!(auth.provenance, Provenance::Synthetic);
        assert_eq!(auth.data.status, "mock_mode");
    }

    #[tokio::test]
    async fn live_symbols_are_returned_in_order() {
        let (gateway, _) = gateway(ScriptedTransport::new().healthy(BASE).respond(
            "/api/stocks",
            Scripted::Json(json!({"stocks": ["NVDA", "AAPL"], "source": "api"})),
        ));

        let stocks = gateway.available_symbols().await;
        assert!(stocks.is_live());
        assert_eq!(stocks.data, symbols(&["NVDA", "AAPL"]));
    }

    #[tokio::test]
    async fn synthetic_correlation_has_unit_diagonal_and_symmetry() {
        let (gateway, _) = gateway(ScriptedTransport::new());

        let report = gateway
            .correlation_matrix(&symbols(&["AAPL", "GOOGL"]), 30)
            .await;
        assert_eq!(report.provenance, Provenance::Synthetic);

        let data = report.data;
        assert_eq!(data.correlation("AAPL", "AAPL"), Some(1.0));
        assert_eq!(data.correlation("GOOGL", "GOOGL"), Some(1.0));
        assert_eq!(
            data.correlation("AAPL", "GOOGL"),
            data.correlation("GOOGL", "AAPL")
        );
        assert_eq!(data.statistics.len(), 2);
        assert_eq!(data.time_range, 30);
    }

    #[tokio::test]
    async fn correlation_query_repeats_symbols_and_dedupes() {
        let (gateway, transport) = gateway(ScriptedTransport::new().healthy(BASE).respond(
            "/api/correlation",
            Scripted::Json(json!({
                "correlations": {
                    "AAPL": {"AAPL": 1.0, "TSLA": -0.3},
                    "TSLA": {"AAPL": -0.3, "TSLA": 1.0}
                },
                "statistics": {
                    "AAPL": {"average": 175.0, "stdDev": 1.0},
                    "TSLA": {"average": 250.0, "stdDev": 4.0}
                },
                "symbols": ["AAPL", "TSLA"],
                "timeRange": 60
            })),
        ));

        let report = gateway
            .correlation_matrix(&symbols(&["AAPL", "TSLA", "AAPL"]), 60)
            .await;
        assert!(report.is_live());
        assert_eq!(report.data.correlation("TSLA", "AAPL"), Some(-0.3));

        let (_, query) = &transport.requests()[0];
        assert_eq!(
            query,
            &vec![
                ("minutes".to_string(), "60".to_string()),
                ("symbols".to_string(), "AAPL".to_string()),
                ("symbols".to_string(), "TSLA".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn empty_symbol_request_uses_defaults() {
        let (gateway, _) = gateway(ScriptedTransport::new());
        let report = gateway.correlation_matrix(&[], 10).await;
        assert_eq!(
            report.data.symbols,
            symbols(&["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "META"])
        );
    }

    #[tokio::test]
    async fn reset_connection_reprobes() {
        let (gateway, transport) = gateway(ScriptedTransport::new().healthy(BASE));

        assert!(gateway.health().await);
        assert!(gateway.health().await);
        assert_eq!(transport.health_calls(BASE), 1);

        gateway.reset_connection().await;
        assert!(gateway.health().await);
        assert_eq!(transport.health_calls(BASE), 2);
        assert_eq!(gateway.active_endpoint().await.as_deref(), Some(BASE));
    }

    #[tokio::test]
    async fn test_authentication_keeps_extra_fields() {
        let (gateway, _) = gateway(ScriptedTransport::new().healthy(BASE).respond(
            "/api/test-auth",
            Scripted::Json(json!({"auth_success": true, "token_valid": true})),
        ));

        let check = gateway.test_authentication().await;
        assert!(check.is_live());
        assert!(check.data.auth_success);
        assert_eq!(check.data.extra["token_valid"], json!(true));

        let (offline, _) = gateway_offline();
        let fallback = offline.test_authentication().await;
        assert!(!fallback.data.auth_success);
        assert_eq!(fallback.data.error.as_deref(), Some("Backend not available"));
    }

    fn gateway_offline() -> (DataGateway, Arc<ScriptedTransport>) {
        gateway(ScriptedTransport::new())
    }
}
