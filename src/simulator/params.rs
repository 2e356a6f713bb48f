//! Per-symbol simulation parameters

use std::collections::HashMap;

/// Base price, volatility and drift used to simulate one symbol
///
/// The unit of `volatility` and `drift` depends on the generator: the random
/// walk treats them as fractions of the current price, the linear trend as
/// absolute price offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolParams {
    pub base_price: f64,
    pub volatility: f64,
    pub drift: f64,
}

impl SymbolParams {
    pub const fn new(base_price: f64, volatility: f64, drift: f64) -> Self {
        Self {
            base_price,
            volatility,
            drift,
        }
    }
}

/// Symbol -> parameter lookup with a fallback for unknown symbols
#[derive(Debug, Clone)]
pub struct ParamTable {
    entries: HashMap<String, SymbolParams>,
    fallback: SymbolParams,
}

impl ParamTable {
    pub fn new(fallback: SymbolParams) -> Self {
        Self {
            entries: HashMap::new(),
            fallback,
        }
    }

    /// Relative volatility of 2% and a drift scale of 0.1% per minute
    pub fn random_walk() -> Self {
        const VOLATILITY: f64 = 0.02;
        const DRIFT_SCALE: f64 = 0.001;

        [
            ("AAPL", 175.5),
            ("GOOGL", 140.25),
            ("MSFT", 380.75),
            ("AMZN", 145.3),
            ("TSLA", 250.8),
            ("META", 320.45),
            ("NVDA", 480.9),
            ("NFLX", 450.15),
        ]
        .into_iter()
        .fold(
            Self::new(SymbolParams::new(100.0, VOLATILITY, DRIFT_SCALE)),
            |table, (symbol, base)| {
                table.with_entry(symbol, SymbolParams::new(base, VOLATILITY, DRIFT_SCALE))
            },
        )
    }

    /// Absolute price noise and a fixed trend reached by the last minute
    pub fn linear_trend() -> Self {
        [
            ("AAPL", SymbolParams::new(175.0, 3.0, 2.0)),
            ("GOOGL", SymbolParams::new(140.0, 4.0, -1.0)),
            ("MSFT", SymbolParams::new(380.0, 5.0, 3.0)),
            ("AMZN", SymbolParams::new(145.0, 6.0, 1.0)),
            ("TSLA", SymbolParams::new(250.0, 15.0, -5.0)),
            ("META", SymbolParams::new(320.0, 8.0, 4.0)),
            ("NVDA", SymbolParams::new(480.0, 12.0, 8.0)),
            ("NFLX", SymbolParams::new(450.0, 10.0, -2.0)),
        ]
        .into_iter()
        .fold(
            Self::new(SymbolParams::new(100.0, 5.0, 0.0)),
            |table, (symbol, params)| table.with_entry(symbol, params),
        )
    }

    pub fn with_entry(mut self, symbol: &str, params: SymbolParams) -> Self {
        self.entries.insert(symbol.to_uppercase(), params);
        self
    }

    /// Parameters for `symbol` (case-insensitive), or the fallback triple
    pub fn lookup(&self, symbol: &str) -> SymbolParams {
        self.entries
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> SymbolParams {
        self.fallback
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
