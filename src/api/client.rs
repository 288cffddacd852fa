//! REST client with bounded retries.
//!
//! # Responsibilities
//! - Attach the `x-api-key` header to every request
//! - Retry failed GETs with linear backoff (see `resilience::retries`)
//! - Decode JSON bodies

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;

use crate::api::types::{ApiError, ApiResult};
use crate::config::ApiConfig;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the enrichment API.
#[derive(Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl FetchClient {
    /// Build a client from configuration.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| ApiError::Setup(format!("invalid API key header: {}", e)))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            policy: RetryPolicy::new(&config.retry),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `path` (relative to the base URL) and decode the JSON body.
    ///
    /// `endpoint` is a static label for logs and metrics.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, endpoint: &'static str) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 1;

        loop {
            if attempt > 1 {
                let delay = self.policy.delay_before(attempt);
                tracing::info!(url = %url, attempt = attempt, delay = ?delay, "Retrying request");
                metrics::record_fetch_retry(endpoint);
                sleep(delay).await;
            }

            let err = match self.attempt::<T>(&url).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let retryable = match &err {
                ApiError::Request { .. } => self.policy.is_retryable(None),
                ApiError::Status { status, .. } => self.policy.is_retryable(Some(*status)),
                _ => false,
            };

            if !retryable {
                return Err(err);
            }

            tracing::warn!(url = %url, attempt = attempt, error = %err, "Request failed");

            if !self.policy.has_attempts_left(attempt) {
                return Err(ApiError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            attempt += 1;
        }
    }

    /// GET `path` and return the untyped JSON body.
    pub async fn get_json(&self, path: &str, endpoint: &'static str) -> ApiResult<Value> {
        self.get(path, endpoint).await
    }

    async fn attempt<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let request_error = |source| ApiError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.http.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .finish()
    }
}
