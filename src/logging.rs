//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the given default level applies.
//! Both initializers are no-ops if a global subscriber already exists.

use tracing_subscriber::EnvFilter;

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Human-readable output
pub fn init(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .try_init();
}

/// One JSON object per line
pub fn init_json(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(default_level))
        .with_current_span(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_does_not_panic() {
        init("debug");
        init("info");
        init_json("warn");
    }
}
