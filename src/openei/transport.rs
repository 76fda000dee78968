//! HTTP plumbing behind the rate database client
//!
//! The client talks to a [`Transport`] and waits through a [`Sleeper`], so the
//! retry policy can be exercised without a network or a real clock.

use crate::error::{Result, TariffError};
use std::time::Duration;
use thiserror::Error;

/// Status and body of one HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failure before any HTTP status was received
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

/// One HTTP GET against the rate database
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> std::result::Result<HttpReply, TransportError>;
}

/// Backoff wait between attempts
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// reqwest-backed transport with a per-attempt timeout
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tou-rates/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TariffError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> std::result::Result<HttpReply, TransportError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify_reqwest_error)?;
        Ok(HttpReply { status, body })
    }
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
