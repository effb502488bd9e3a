//! Bounded slow-path caller.
//!
//! The service call runs on a helper thread and is awaited with
//! `recv_timeout`. A call that overruns is abandoned: its eventual result is
//! dropped with the channel. Every failure is logged and counted by the
//! breaker; callers only see the error and fall back to their fast path.

use super::breaker::{BreakerState, CallBreaker};
use super::http::HttpIntelligenceService;
use super::offline::OfflineIntelligence;
use super::{ExternalServiceError, IntelRequest, IntelResponse, IntelligenceService};
use crate::config::{ConfigError, IntelligenceConfig};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug)]
pub struct SlowPath {
    service: Arc<dyn IntelligenceService>,
    timeout: Duration,
    breaker: CallBreaker,
}

impl SlowPath {
    pub fn new(service: Arc<dyn IntelligenceService>, config: &IntelligenceConfig) -> Self {
        Self {
            service,
            timeout: Duration::from_millis(config.timeout_ms),
            breaker: CallBreaker::new(config.failure_threshold, config.cooldown_calls),
        }
    }

    /// HTTP client when an endpoint is configured, offline model otherwise.
    pub fn from_config(config: &IntelligenceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let service: Arc<dyn IntelligenceService> = match &config.endpoint {
            Some(endpoint) => Arc::new(HttpIntelligenceService::new(
                endpoint.clone(),
                Duration::from_millis(config.timeout_ms),
            )?),
            None => Arc::new(OfflineIntelligence::new()),
        };
        Ok(Self::new(service, config))
    }

    pub fn offline(config: &IntelligenceConfig) -> Self {
        Self::new(Arc::new(OfflineIntelligence::new()), config)
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Forget breaker history, for a new episode.
    pub fn reset(&mut self) {
        self.breaker.reset();
    }

    /// Consult the service, bounded by the configured timeout.
    pub fn consult(&mut self, request: &IntelRequest) -> Result<IntelResponse, ExternalServiceError> {
        if !self.breaker.try_acquire() {
            tracing::debug!(asset = %request.asset, "slow path skipped, breaker open");
            return Err(ExternalServiceError::CircuitOpen);
        }

        let result = self.call_with_timeout(request);
        match &result {
            Ok(response) => {
                self.breaker.record_success();
                tracing::debug!(
                    service = self.service.name(),
                    probability = response.manipulation_probability,
                    confidence = response.confidence,
                    "slow path answered"
                );
            }
            Err(err) => {
                self.breaker.record_failure();
                tracing::warn!(
                    service = self.service.name(),
                    error = %err,
                    "slow path failed, falling back to fast path"
                );
            }
        }
        result
    }

    fn call_with_timeout(&self, request: &IntelRequest) -> Result<IntelResponse, ExternalServiceError> {
        let (tx, rx) = mpsc::channel();
        let service = Arc::clone(&self.service);
        let request = request.clone();

        thread::Builder::new()
            .name("sentinel-slow-path".into())
            .spawn(move || {
                // Receiver may be gone after a timeout.
                let _ = tx.send(service.classify(&request));
            })
            .map_err(|e| ExternalServiceError::Unavailable(format!("failed to spawn caller: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result.and_then(IntelResponse::validate),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ExternalServiceError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ExternalServiceError::Unavailable(
                "service call panicked".into(),
            )),
        }
    }
}
