//! Configuration management for StockCorr
//!
//! Loads defaults, optional `config/default` and `config/local` files, then
//! `STOCKCORR__*` environment variables (with `.env` support).

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::simulator::SimulationStrategy;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Backend base URLs, probed in order
    pub candidates: Vec<String>,
    /// Health check timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Live request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Symbols offered when the backend cannot list them
    pub default_symbols: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            default_symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// Generator used for synthetic series
    pub strategy: SimulationStrategy,
    /// Minutes requested when the caller does not choose
    pub default_minutes: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            strategy: SimulationStrategy::default(),
            default_minutes: DEFAULT_MINUTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Gateway defaults
            .set_default("gateway.candidates", DEFAULT_CANDIDATES.to_vec())?
            .set_default("gateway.probe_timeout_ms", DEFAULT_PROBE_TIMEOUT_MS)?
            .set_default("gateway.request_timeout_ms", DEFAULT_REQUEST_TIMEOUT_MS)?
            .set_default("gateway.default_symbols", DEFAULT_SYMBOLS.to_vec())?
            // Simulator defaults
            .set_default("simulator.strategy", "random_walk")?
            .set_default("simulator.default_minutes", DEFAULT_MINUTES as u64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (STOCKCORR__*)
            .add_source(
                Environment::with_prefix("STOCKCORR")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gateway.candidates")
                    .with_list_parse_key("gateway.default_symbols")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings the gateway cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.gateway.candidates.is_empty() {
            bail!("gateway.candidates must list at least one backend URL");
        }
        if self.gateway.probe_timeout_ms == 0 || self.gateway.request_timeout_ms == 0 {
            bail!("gateway timeouts must be greater than zero");
        }
        if self.gateway.default_symbols.is_empty() {
            bail!("gateway.default_symbols must not be empty");
        }
        if self.simulator.default_minutes == 0 {
            bail!("simulator.default_minutes must be greater than zero");
        }
        Ok(())
    }

    /// One-line summary for logging
    pub fn digest(&self) -> String {
        format!(
            "candidates={:?} probe_timeout={}ms request_timeout={}ms strategy={} minutes={}",
            self.gateway.candidates,
            self.gateway.probe_timeout_ms,
            self.gateway.request_timeout_ms,
            self.simulator.strategy,
            self.simulator.default_minutes
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
