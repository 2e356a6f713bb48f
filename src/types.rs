//! Core types used throughout StockCorr
//!
//! Defines price points, series, statistics, correlation matrices and the
//! provenance-tagged response shapes handed to the presentation layer.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lowest price any point may carry
pub const MIN_PRICE: f64 = 1.0;

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Returned by the remote service
    Live,
    /// Generated locally because the service was unavailable
    Synthetic,
}

impl Provenance {
    pub fn is_live(&self) -> bool {
        matches!(self, Provenance::Live)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => write!(f, "live"),
            Provenance::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Payload tagged with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub data: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Live,
        }
    }

    pub fn synthetic(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Synthetic,
        }
    }

    pub fn is_live(&self) -> bool {
        self.provenance.is_live()
    }
}

/// Single price observation
///
/// Prices are always finite and at least [`MIN_PRICE`] for simulated points,
/// and strictly positive for parsed ones. The display time is derived from
/// the timestamp at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    timestamp: DateTime<Utc>,
    price: f64,
    #[serde(rename = "time")]
    display_time: String,
}

impl PricePoint {
    /// Build a point from a parsed price, rejecting non-finite or non-positive values
    pub fn try_new(timestamp: DateTime<Utc>, price: f64) -> Option<Self> {
        if !price.is_finite() || price <= 0.0 {
            return None;
        }
        Some(Self {
            timestamp,
            price,
            display_time: display_time(timestamp),
        })
    }

    /// Build a point with the price floored at [`MIN_PRICE`]
    pub fn floored(timestamp: DateTime<Utc>, price: f64) -> Self {
        let price = if price.is_finite() {
            price.max(MIN_PRICE)
        } else {
            MIN_PRICE
        };
        Self {
            timestamp,
            price,
            display_time: display_time(timestamp),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Local 24h clock string, e.g. "14:05"
    pub fn display_time(&self) -> &str {
        &self.display_time
    }
}

fn display_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Chronological price points for one symbol, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSeries {
    pub symbol: String,
    #[serde(rename = "data")]
    pub points: Vec<PricePoint>,
}

impl SymbolSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(PricePoint::price).collect()
    }

    /// Arithmetic mean of the prices (0 for an empty series)
    pub fn average(&self) -> f64 {
        crate::stats::mean(&self.prices())
    }

    /// Last price against the one before it
    pub fn price_change(&self) -> PriceChange {
        let current = self.points.last().map(PricePoint::price).unwrap_or(0.0);
        let previous = if self.points.len() > 1 {
            self.points[self.points.len() - 2].price()
        } else {
            current
        };
        PriceChange::between(previous, current)
    }
}

/// Movement between the two most recent prices
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceChange {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_pct: f64,
}

impl PriceChange {
    pub fn between(previous: f64, current: f64) -> Self {
        let change = current - previous;
        let change_pct = if previous != 0.0 {
            change / previous * 100.0
        } else {
            0.0
        };
        Self {
            current,
            previous,
            change,
            change_pct,
        }
    }
}

/// Mean and sample standard deviation of a price series
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub average: f64,
    #[serde(rename = "stdDev")]
    pub std_dev: f64,
}

/// Symmetric symbol-by-symbol correlation table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationMatrix {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CorrelationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.rows.get(a).and_then(|row| row.get(b)).copied()
    }

    pub fn set(&mut self, a: &str, b: &str, value: f64) {
        self.rows
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), value);
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.rows.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.values().flat_map(|row| row.values().copied())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Qualitative strength of a correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationBand {
    StrongPositive,
    ModeratePositive,
    WeakPositive,
    Neutral,
    WeakNegative,
    ModerateNegative,
    StrongNegative,
}

impl CorrelationBand {
    pub fn classify(r: f64) -> Self {
        if r > 0.7 {
            CorrelationBand::StrongPositive
        } else if r > 0.3 {
            CorrelationBand::ModeratePositive
        } else if r > 0.1 {
            CorrelationBand::WeakPositive
        } else if r > -0.1 {
            CorrelationBand::Neutral
        } else if r > -0.3 {
            CorrelationBand::WeakNegative
        } else if r > -0.7 {
            CorrelationBand::ModerateNegative
        } else {
            CorrelationBand::StrongNegative
        }
    }
}

impl fmt::Display for CorrelationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CorrelationBand::StrongPositive => "strong positive",
            CorrelationBand::ModeratePositive => "moderate positive",
            CorrelationBand::WeakPositive => "weak positive",
            CorrelationBand::Neutral => "neutral",
            CorrelationBand::WeakNegative => "weak negative",
            CorrelationBand::ModerateNegative => "moderate negative",
            CorrelationBand::StrongNegative => "strong negative",
        };
        write!(f, "{}", label)
    }
}

/// Series response for one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSeries {
    #[serde(flatten)]
    pub series: SymbolSeries,
    pub average: f64,
    pub count: usize,
    #[serde(rename = "timeRange")]
    pub time_range: usize,
}

impl StockSeries {
    pub fn new(series: SymbolSeries, average: f64, time_range: usize) -> Self {
        let count = series.len();
        Self {
            series,
            average,
            count,
            time_range,
        }
    }
}

/// Correlation heatmap response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    #[serde(rename = "correlations")]
    pub matrix: CorrelationMatrix,
    pub statistics: BTreeMap<String, DescriptiveStats>,
    pub symbols: Vec<String>,
    #[serde(rename = "timeRange")]
    pub time_range: usize,
}

impl CorrelationReport {
    pub fn correlation(&self, a: &str, b: &str) -> Option<f64> {
        self.matrix.get(a, b)
    }

    pub fn band(&self, a: &str, b: &str) -> Option<CorrelationBand> {
        self.correlation(a, b).map(CorrelationBand::classify)
    }
}

/// Backend authentication state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub token_expires: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
}

impl AuthStatus {
    pub fn offline() -> Self {
        Self {
            authenticated: false,
            token_expires: None,
            status: "mock_mode".to_string(),
            error: None,
            api_endpoint: None,
        }
    }
}

/// Result of asking the backend to authenticate against its upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthCheck {
    pub auth_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Implementation-defined fields such as `token_valid` or `api_endpoint`
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthCheck {
    pub fn offline() -> Self {
        Self {
            auth_success: false,
            error: Some("Backend not available".to_string()),
            extra: serde_json::Map::new(),
        }
    }
}
