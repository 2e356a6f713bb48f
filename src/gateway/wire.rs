//! Backend JSON payloads and their conversion into domain types
//!
//! Anything that does not fit the domain invariants is reported as
//! [`GatewayError::Payload`] so the caller falls back to synthetic data.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::{GatewayError, GatewayResult};
use crate::types::{
    CorrelationMatrix, CorrelationReport, DescriptiveStats, PricePoint, StockSeries, SymbolSeries,
};

/// Slack allowed on correlation coefficients before they are rejected
const CORRELATION_TOLERANCE: f64 = 1e-9;

/// `GET /api/stocks`
#[derive(Debug, Clone, Deserialize)]
pub struct WireSymbols {
    pub stocks: Vec<String>,
}

impl WireSymbols {
    pub fn into_symbols(self) -> GatewayResult<Vec<String>> {
        let symbols: Vec<String> = self
            .stocks
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if symbols.is_empty() {
            return Err(GatewayError::Payload("empty symbol list".to_string()));
        }
        Ok(symbols)
    }
}

/// One price item; `value` is accepted in place of `price`
#[derive(Debug, Clone, Deserialize)]
pub struct WirePoint {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, alias = "value")]
    pub price: Option<serde_json::Value>,
}

/// `GET /api/stocks/{symbol}`
#[derive(Debug, Clone, Deserialize)]
pub struct WireSeries {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(alias = "prices", alias = "stockData")]
    pub data: Vec<WirePoint>,
    #[serde(default)]
    pub average: Option<f64>,
}

impl WireSeries {
    /// Validate into a series holding at most the last `minutes` points
    pub fn into_stock_series(self, requested: &str, minutes: usize) -> GatewayResult<StockSeries> {
        let mut points = self
            .data
            .iter()
            .enumerate()
            .map(|(i, item)| parse_point(item).ok_or_else(|| invalid_point(i, item)))
            .collect::<GatewayResult<Vec<PricePoint>>>()?;

        if points.is_empty() {
            return Err(GatewayError::Payload(format!(
                "no price points for {}",
                requested
            )));
        }

        points.sort_by_key(PricePoint::timestamp);
        let trimmed = points.len() > minutes;
        if trimmed {
            points.drain(..points.len() - minutes);
        }

        let symbol = self
            .symbol
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| requested.to_string());
        let series = SymbolSeries::new(symbol, points);

        // The service average only describes the points when none were dropped
        let average = match self.average {
            Some(avg) if avg.is_finite() && !trimmed => avg,
            _ => series.average(),
        };

        Ok(StockSeries::new(series, average, minutes))
    }
}

fn invalid_point(index: usize, item: &WirePoint) -> GatewayError {
    GatewayError::Payload(format!(
        "invalid price point #{} (timestamp={:?}, price={:?})",
        index, item.timestamp, item.price
    ))
}

fn parse_point(item: &WirePoint) -> Option<PricePoint> {
    let timestamp = parse_timestamp(item.timestamp.as_deref()?)?;
    let price = parse_price(item.price.as_ref()?)?;
    PricePoint::try_new(timestamp, price)
}

fn parse_price(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// RFC 3339, or a naive ISO timestamp read as local time
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

/// `GET /api/correlation`
#[derive(Debug, Clone, Deserialize)]
pub struct WireCorrelation {
    pub correlations: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub statistics: BTreeMap<String, DescriptiveStats>,
    pub symbols: Vec<String>,
}

impl WireCorrelation {
    pub fn into_report(self, minutes: usize) -> GatewayResult<CorrelationReport> {
        if self.symbols.is_empty() {
            return Err(GatewayError::Payload(
                "correlation payload lists no symbols".to_string(),
            ));
        }

        let mut matrix = CorrelationMatrix::new();
        for a in &self.symbols {
            let row = self
                .correlations
                .get(a)
                .ok_or_else(|| GatewayError::Payload(format!("missing correlation row {}", a)))?;

            for b in &self.symbols {
                let value = row.get(b).copied().ok_or_else(|| {
                    GatewayError::Payload(format!("missing correlation {}/{}", a, b))
                })?;
                if !value.is_finite() || value.abs() > 1.0 + CORRELATION_TOLERANCE {
                    return Err(GatewayError::Payload(format!(
                        "correlation {}/{} out of range: {}",
                        a, b, value
                    )));
                }
                let value = if a == b { 1.0 } else { value.clamp(-1.0, 1.0) };
                matrix.set(a, b, value);
            }
        }

        for (i, a) in self.symbols.iter().enumerate() {
            for b in &self.symbols[i + 1..] {
                let (ab, ba) = (matrix.get(a, b), matrix.get(b, a));
                if let (Some(ab), Some(ba)) = (ab, ba) {
                    if (ab - ba).abs() > CORRELATION_TOLERANCE {
                        return Err(GatewayError::Payload(format!(
                            "asymmetric correlation {}/{}: {} vs {}",
                            a, b, ab, ba
                        )));
                    }
                }
            }
        }

        let mut statistics = BTreeMap::new();
        for symbol in &self.symbols {
            let stats = self
                .statistics
                .get(symbol)
                .copied()
                .ok_or_else(|| GatewayError::Payload(format!("missing statistics {}", symbol)))?;
            if !stats.average.is_finite() || !stats.std_dev.is_finite() {
                return Err(GatewayError::Payload(format!(
                    "non-finite statistics for {}",
                    symbol
                )));
            }
            statistics.insert(symbol.clone(), stats);
        }

        Ok(CorrelationReport {
            matrix,
            statistics,
            symbols: self.symbols,
            time_range: minutes,
        })
    }
}
