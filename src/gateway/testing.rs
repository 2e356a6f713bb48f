//! In-memory transport for gateway unit tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use super::error::{GatewayError, GatewayResult};
use super::transport::{Query, RemoteCall};

#[derive(Debug, Clone)]
pub enum Scripted {
    Json(serde_json::Value),
    Raw(&'static str),
    Status(u16),
    Timeout,
}

#[derive(Default)]
pub struct ScriptedTransport {
    healthy: HashSet<String>,
    responses: HashMap<String, Scripted>,
    health_calls: Mutex<HashMap<String, usize>>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn healthy(mut self, base: &str) -> Self {
        self.healthy.insert(base.to_string());
        self
    }

    pub fn respond(mut self, path: &str, response: Scripted) -> Self {
        self.responses.insert(path.to_string(), response);
        self
    }

    pub fn health_calls(&self, base: &str) -> usize {
        self.health_calls
            .lock()
            .unwrap()
            .get(base)
            .copied()
            .unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteCall for ScriptedTransport {
    async fn check_health(&self, base: &str, _timeout: Duration) -> GatewayResult<()> {
        *self
            .health_calls
            .lock()
            .unwrap()
            .entry(base.to_string())
            .or_default() += 1;

        if self.healthy.contains(base) {
            Ok(())
        } else {
            Err(GatewayError::Timeout {
                url: format!("{}/health", base),
            })
        }
    }

    async fn get_json(
        &self,
        base: &str,
        path: &str,
        query: &Query,
        _timeout: Duration,
    ) -> GatewayResult<serde_json::Value> {
        self.requests.lock().unwrap().push((
            path.to_string(),
            query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));

        let url = format!("{}{}", base, path);
        match self.responses.get(path) {
            Some(Scripted::Json(value)) => Ok(value.clone()),
            Some(Scripted::Raw(body)) => {
                serde_json::from_str(body).map_err(|source| GatewayError::Decode { url, source })
            }
            Some(Scripted::Status(status)) => Err(GatewayError::Status {
                status: *status,
                url,
            }),
            Some(Scripted::Timeout) => Err(GatewayError::Timeout { url }),
            None => Err(GatewayError::Status { status: 404, url }),
        }
    }
}
