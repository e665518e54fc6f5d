//! Byte transport shared by thumbnail fetches and feed page fetches.
//!
//! Everything network-specific (TLS, headers, pooling, timeouts) lives behind
//! the [`Transport`] trait so the fetch coordinator and feed sources can be
//! exercised in tests with an in-memory fake.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::TransportError;

/// Retrieve the raw body for a URL.
///
/// Called from worker threads, so implementations must be [`Send`] and
/// [`Sync`].  Blocking is expected.
pub trait Transport: Send + Sync {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// [`Transport`] backed by a pooled blocking [`reqwest`] client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a client with the given per-request timeout and `User-Agent`.
    ///
    /// Reddit rejects requests carrying a generic agent string, so callers
    /// should always pass something identifying.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(response.bytes()?.to_vec())
    }
}
