//! Synthetic price series
//!
//! Generates per-minute price series so the dashboard stays usable without a
//! backend. Two generators are available and stay separate because they
//! behave differently: the random walk compounds its noise from one minute to
//! the next, the linear trend draws independent noise around a straight line.

mod params;

pub use params::{ParamTable, SymbolParams};

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, RngCore};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::types::{PricePoint, SymbolSeries, MIN_PRICE};

/// Produces the raw price sequence for one symbol, oldest first
pub trait SeriesGenerator: Send + Sync {
    /// Generator name for logging
    fn name(&self) -> &'static str;

    /// Parameter table the generator reads from
    fn params(&self) -> &ParamTable;

    /// Generate `minutes` prices, each at least [`MIN_PRICE`]
    fn prices(&self, params: &SymbolParams, minutes: usize, rng: &mut dyn RngCore) -> Vec<f64>;
}

/// Uniform draw from [-0.5, 0.5)
fn symmetric(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>() - 0.5
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Compounding random walk with a per-series drift
///
/// Drift is drawn once per series as `U * params.drift`; each minute then
/// moves the price by `price * volatility * U'` plus `price * drift`.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    table: ParamTable,
}

impl RandomWalk {
    pub fn new(table: ParamTable) -> Self {
        Self { table }
    }
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self::new(ParamTable::random_walk())
    }
}

impl SeriesGenerator for RandomWalk {
    fn name(&self) -> &'static str {
        "random_walk"
    }

    fn params(&self) -> &ParamTable {
        &self.table
    }

    fn prices(&self, params: &SymbolParams, minutes: usize, rng: &mut dyn RngCore) -> Vec<f64> {
        let trend = symmetric(rng) * params.drift;
        let mut price = params.base_price.max(MIN_PRICE);

        (0..minutes)
            .map(|_| {
                let random_change = symmetric(rng) * params.volatility * price;
                let trend_change = trend * price;
                price = (price + random_change + trend_change).max(MIN_PRICE);
                // The walk keeps full precision; only the emitted price is rounded
                round_cents(price)
            })
            .collect()
    }
}

/// Independent noise around a line from the base price to `base + drift`
#[derive(Debug, Clone)]
pub struct LinearTrend {
    table: ParamTable,
}

impl LinearTrend {
    pub fn new(table: ParamTable) -> Self {
        Self { table }
    }
}

impl Default for LinearTrend {
    fn default() -> Self {
        Self::new(ParamTable::linear_trend())
    }
}

impl SeriesGenerator for LinearTrend {
    fn name(&self) -> &'static str {
        "linear_trend"
    }

    fn params(&self) -> &ParamTable {
        &self.table
    }

    fn prices(&self, params: &SymbolParams, minutes: usize, rng: &mut dyn RngCore) -> Vec<f64> {
        let n = minutes as f64;
        (0..minutes)
            .map(|i| {
                let random_offset = symmetric(rng) * params.volatility;
                let trend_offset = params.drift * (i + 1) as f64 / n;
                (params.base_price + random_offset + trend_offset).max(MIN_PRICE)
            })
            .collect()
    }
}

/// Selectable generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStrategy {
    #[default]
    RandomWalk,
    LinearTrend,
}

impl SimulationStrategy {
    pub fn generator(&self) -> Arc<dyn SeriesGenerator> {
        match self {
            SimulationStrategy::RandomWalk => Arc::new(RandomWalk::default()),
            SimulationStrategy::LinearTrend => Arc::new(LinearTrend::default()),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "random_walk" | "random-walk" | "walk" => Some(SimulationStrategy::RandomWalk),
            "linear_trend" | "linear-trend" | "linear" => Some(SimulationStrategy::LinearTrend),
            _ => None,
        }
    }
}

impl fmt::Display for SimulationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationStrategy::RandomWalk => write!(f, "random_walk"),
            SimulationStrategy::LinearTrend => write!(f, "linear_trend"),
        }
    }
}

/// Turns generator output into timestamped series ending at "now"
#[derive(Clone)]
pub struct SeriesSimulator {
    generator: Arc<dyn SeriesGenerator>,
}

impl SeriesSimulator {
    pub fn new(strategy: SimulationStrategy) -> Self {
        Self {
            generator: strategy.generator(),
        }
    }

    pub fn with_generator(generator: Arc<dyn SeriesGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Generate a series ending at the current instant
    pub fn generate(&self, symbol: &str, minutes: usize) -> SymbolSeries {
        let mut rng = rand::thread_rng();
        self.generate_at(symbol, minutes, Utc::now(), &mut rng)
    }

    /// Generate a series whose last point is dated `now`, one minute apart
    pub fn generate_at(
        &self,
        symbol: &str,
        minutes: usize,
        now: DateTime<Utc>,
        rng: &mut dyn RngCore,
    ) -> SymbolSeries {
        let params = self.generator.params().lookup(symbol);
        let prices = self.generator.prices(&params, minutes, rng);

        let points = prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| {
                let minutes_back = (minutes - i - 1) as i64;
                PricePoint::floored(now - Duration::minutes(minutes_back), price)
            })
            .collect();

        tracing::trace!(
            symbol = %symbol,
            minutes,
            generator = self.generator.name(),
            "Generated synthetic series"
        );

        SymbolSeries::new(symbol, points)
    }
}

impl Default for SeriesSimulator {
    fn default() -> Self {
        Self::new(SimulationStrategy::default())
    }
}

impl fmt::Debug for SeriesSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesSimulator")
            .field("generator", &self.generator.name())
            .finish()
    }
}
