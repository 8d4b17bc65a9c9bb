//! services/api/src/adapters/http_probe.rs
//!
//! This module contains the adapter that checks whether a file host URL answers.
//! It implements the `ReachabilityService` port from the `core` crate.

use async_trait::async_trait;
use biblio_core::ports::{PortError, PortResult, ReachabilityService};
use std::time::Duration;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ReachabilityService` with a single HTTP `HEAD` request.
#[derive(Clone)]
pub struct HttpProbeAdapter {
    client: reqwest::Client,
}

impl HttpProbeAdapter {
    /// Creates a new `HttpProbeAdapter` whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

//=========================================================================================
// `ReachabilityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReachabilityService for HttpProbeAdapter {
    async fn probe(&self, url: &str) -> PortResult<bool> {
        let response = self.client.head(url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                PortError::Unavailable(e.to_string())
            } else {
                PortError::Unexpected(e.to_string())
            }
        })?;

        debug!("Probe of {} answered {}", url, response.status());
        Ok(response.status().is_success())
    }
}
