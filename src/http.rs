//! Shared HTTP client construction.

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::Result;
use crate::config::DownloadConfig;

/// Client with a request timeout, user agent and transient-failure retries.
pub fn build_client(config: &DownloadConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()?;

    let min_interval = config.retry_delay().max(Duration::from_millis(1));
    let policy = ExponentialBackoff::builder()
        .retry_bounds(min_interval, min_interval * 8)
        .build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(policy))
        .build())
}
