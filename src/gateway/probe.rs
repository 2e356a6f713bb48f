//! Backend endpoint discovery
//!
//! Sweeps an ordered candidate list with a short health check and caches the
//! first endpoint that answers. The cache is sticky: once set it is returned
//! without re-probing until [`ConnectionProbe::reset`] or
//! [`ConnectionProbe::invalidate`] clears it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::transport::RemoteCall;

#[derive(Debug, Default)]
struct ProbeState {
    active: Option<String>,
    attempted: bool,
}

/// Shared handle to the endpoint cache
///
/// Clones share the same cache.
#[derive(Clone)]
pub struct ConnectionProbe {
    transport: Arc<dyn RemoteCall>,
    candidates: Arc<[String]>,
    timeout: Duration,
    state: Arc<RwLock<ProbeState>>,
}

impl ConnectionProbe {
    pub fn new(transport: Arc<dyn RemoteCall>, candidates: Vec<String>, timeout: Duration) -> Self {
        Self {
            transport,
            candidates: candidates.into(),
            timeout,
            state: Arc::new(RwLock::new(ProbeState::default())),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Cached endpoint, or the first candidate that passes a health check
    pub async fn discover(&self) -> Option<String> {
        {
            let state = self.state.read().await;
            if state.attempted {
                if let Some(active) = &state.active {
                    return Some(active.clone());
                }
            }
        }

        self.state.write().await.attempted = true;

        for candidate in self.candidates.iter() {
            debug!(endpoint = %candidate, "Probing backend");
            match self.transport.check_health(candidate, self.timeout).await {
                Ok(()) => {
                    self.state.write().await.active = Some(candidate.clone());
                    info!(endpoint = %candidate, "✅ Connected to backend");
                    return Some(candidate.clone());
                }
                Err(e) => {
                    debug!(endpoint = %candidate, error = %e, "Backend candidate unreachable");
                }
            }
        }

        self.state.write().await.active = None;
        warn!(
            candidates = self.candidates.len(),
            "No backend connection available"
        );
        None
    }

    /// Forget the cached endpoint and the attempt flag
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.active = None;
        state.attempted = false;
        debug!("Connection state reset");
    }

    /// Drop the cached endpoint after a failed live call
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        if let Some(endpoint) = state.active.take() {
            debug!(endpoint = %endpoint, "Invalidated backend endpoint");
        }
    }

    pub async fn active_endpoint(&self) -> Option<String> {
        self.state.read().await.active.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.active.is_some()
    }
}

impl std::fmt::Debug for ConnectionProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProbe")
            .field("candidates", &self.candidates)
            .field("timeout", &self.timeout)
            .finish()
    }
}
