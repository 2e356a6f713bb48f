//! Remote-call primitive used by the live path

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use std::time::Duration;

use super::error::{GatewayError, GatewayResult};

/// Query string as ordered key/value pairs; keys may repeat
pub type Query = Vec<(&'static str, String)>;

/// Minimal GET-over-JSON transport
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// `GET {base}/health`, succeeding only on a 2xx status
    async fn check_health(&self, base: &str, timeout: Duration) -> GatewayResult<()>;

    /// `GET {base}{path}?{query}` decoded as JSON
    async fn get_json(
        &self,
        base: &str,
        path: &str,
        query: &Query,
        timeout: Duration,
    ) -> GatewayResult<serde_json::Value>;
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            client: Client::builder()
                .default_headers(headers)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteCall for HttpTransport {
    async fn check_health(&self, base: &str, timeout: Duration) -> GatewayResult<()> {
        let url = join(base, "/health");

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| GatewayError::from_request(e, &url))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(GatewayError::Status {
                status: response.status().as_u16(),
                url,
            })
        }
    }

    async fn get_json(
        &self,
        base: &str,
        path: &str,
        query: &Query,
        timeout: Duration,
    ) -> GatewayResult<serde_json::Value> {
        let url = join(base, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| GatewayError::from_request(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_request(e, &url))?;

        serde_json::from_slice(&body).map_err(|source| GatewayError::Decode { url, source })
    }
}
