//! HTTP intelligence client.
//!
//! POSTs the request as JSON and expects an [`IntelResponse`] body. The
//! client carries its own request timeout; [`SlowPath`](super::SlowPath)
//! bounds the whole call on top of that.

use super::{ExternalServiceError, IntelRequest, IntelResponse, IntelligenceService};
use crate::config::ConfigError;
use std::time::Duration;

pub struct HttpIntelligenceService {
    client: reqwest::blocking::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpIntelligenceService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sentinel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Malformed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl IntelligenceService for HttpIntelligenceService {
    fn name(&self) -> &str {
        "http"
    }

    fn classify(&self, request: &IntelRequest) -> Result<IntelResponse, ExternalServiceError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ExternalServiceError::Timeout {
                        after_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    ExternalServiceError::Unavailable(e.to_string())
                }
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ExternalServiceError::RateLimited);
        }
        if !status.is_success() {
            return Err(ExternalServiceError::Unavailable(format!("HTTP {status}")));
        }

        let body: IntelResponse = resp
            .json()
            .map_err(|e| ExternalServiceError::Malformed(e.to_string()))?;
        body.validate()
    }
}
