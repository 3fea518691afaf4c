//! HTTP health probe against a backend's `/health` endpoint.

use std::time::{Duration, Instant};

use reqwest::Client;

use crate::{BackendConfig, ClientError};

pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub url: String,
    pub status: u16,
    pub healthy: bool,
    pub latency: Duration,
    pub body: String,
}

pub async fn check_backend_health(backend: &BackendConfig) -> Result<HealthReport, ClientError> {
    check_backend_health_with_timeout(backend, DEFAULT_HEALTH_TIMEOUT).await
}

/// Any 2xx answer counts as healthy; other statuses are reported, not raised.
pub async fn check_backend_health_with_timeout(
    backend: &BackendConfig,
    timeout: Duration,
) -> Result<HealthReport, ClientError> {
    backend
        .validate()
        .map_err(|err| ClientError::invalid_request(err.to_string()))?;

    let url = backend.health_url();
    let http = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ClientError::transport(err.to_string()))?;

    let started = Instant::now();
    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|err| ClientError::transport(format!("health check {url} failed: {err}")))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| ClientError::transport(format!("health check {url} body: {err}")))?;

    Ok(HealthReport {
        url,
        status: status.as_u16(),
        healthy: status.is_success(),
        latency: started.elapsed(),
        body,
    })
}
