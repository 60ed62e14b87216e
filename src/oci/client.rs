// src/oci/client.rs

//! HTTP client for ordinals content index pages
//!
//! Provides a wrapper around reqwest with retry support for fetching
//! inscription page bodies from the configured gateway.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed fetches
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// HTTP client wrapper with retry support
#[derive(Debug)]
pub struct OciClient {
    origin: Url,
    client: Client,
    max_retries: u32,
}

impl OciClient {
    /// Create a new client against an ordinals gateway origin
    pub fn new(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| Error::ConfigError(format!("Invalid source origin {origin}: {e}")))?;

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            origin,
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Resolve an inscription path against the gateway origin
    pub fn page_url(&self, path: &str) -> Result<Url> {
        self.origin
            .join(path)
            .map_err(|e| Error::ConfigError(format!("Invalid page path {path}: {e}")))
    }

    /// Fetch one raw page body with retry support.
    ///
    /// Transport failures are retried with backoff; an HTTP error status
    /// is returned immediately since the gateway already answered.
    pub fn fetch_page(&self, path: &str) -> Result<String> {
        let url = self.page_url(path)?;
        info!("Fetching page from {}", url);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let body = response.text().map_err(|e| {
                        Error::DownloadError(format!("Failed to read page body: {e}"))
                    })?;

                    info!("Fetched {} bytes from {}", body.len(), url);
                    return Ok(body);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "Failed to fetch page after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Page fetch attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}
