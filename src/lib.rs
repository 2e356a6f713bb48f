//! StockCorr Library
//!
//! Stock price series, descriptive statistics and Pearson correlation
//! heatmaps, served from a live backend when one is reachable and
//! synthesized locally when it is not.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod simulator;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use gateway::{ConnectionProbe, DataGateway};
pub use simulator::{SeriesSimulator, SimulationStrategy};
pub use types::{Provenance, Sourced};
