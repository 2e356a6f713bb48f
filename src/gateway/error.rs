use thiserror::Error;

/// Failure of a single live call
///
/// Never leaves the gateway: every variant is turned into a synthetic
/// fallback by [`super::DataGateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no reachable backend endpoint")]
    NoEndpoint,

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("malformed json from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid payload: {0}")]
    Payload(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Classify a reqwest failure, keeping timeouts distinct
    pub fn from_request(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout {
                url: url.to_string(),
            }
        } else {
            GatewayError::Http(err)
        }
    }

    /// Whether the failure should drop the cached endpoint
    pub fn invalidates_endpoint(&self) -> bool {
        !matches!(self, GatewayError::NoEndpoint)
    }
}
