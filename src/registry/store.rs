// src/registry/store.rs

//! Versioned remote store access
//!
//! Publication targets the GitHub contents API: every registry file is
//! one repository object addressed by path and branch, carrying an
//! opaque revision token (the blob SHA) that must accompany updates.
//! The [`ContentStore`] trait is the seam the publisher works against,
//! keeping publish policy testable without network access.

use crate::config::GithubSection;
use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every API request
const USER_AGENT: &str = concat!("satdex/", env!("CARGO_PKG_VERSION"));

/// Pinned GitHub REST API version
const API_VERSION: &str = "2022-11-28";

/// Current remote state of one stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Opaque revision token required for a safe update
    pub revision: String,
    /// Remote content size in bytes
    pub size: u64,
}

/// The three store operations the publisher consumes
pub trait ContentStore {
    /// Look up the current revision of `path`; `None` means the object
    /// does not exist remotely
    fn get(&self, path: &str) -> Result<Option<RemoteObject>>;

    /// Create a new object at `path`
    fn create(&self, path: &str, content: &str, message: &str) -> Result<()>;

    /// Overwrite the object at `path` under its current revision token
    fn update(&self, path: &str, content: &str, message: &str, revision: &str) -> Result<()>;
}

/// Contents-API metadata for an existing object
#[derive(Debug, Deserialize)]
struct ContentInfo {
    sha: String,
    #[serde(default)]
    size: u64,
}

/// Contents-API write request; `sha` is present only for updates
#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// GitHub-backed content store
pub struct GithubStore {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

impl GithubStore {
    /// Create a store client from the configured GitHub coordinates
    pub fn new(github: &GithubSection) -> Result<Self> {
        let token = github.resolve_token().ok_or_else(|| {
            Error::ConfigError(
                "No GitHub token configured; set github.token or GITHUB_TOKEN".to_string(),
            )
        })?;
        if github.owner.is_empty() {
            return Err(Error::ConfigError(
                "github.owner is not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: github.api_base.trim_end_matches('/').to_string(),
            owner: github.owner.clone(),
            repo: github.repo.clone(),
            branch: github.branch.clone(),
            token,
        })
    }

    /// Contents-API URL for one repository path
    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Attach the standard API headers to a request
    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Issue one contents-API write
    fn put(&self, path: &str, request: &PutRequest) -> Result<()> {
        let url = self.contents_url(path);
        let response = self
            .with_headers(self.client.put(&url))
            .json(request)
            .send()
            .map_err(|e| Error::StoreError(format!("Failed to reach {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::StoreError(format!(
                "HTTP {status} writing {path}: {body}"
            )));
        }
        Ok(())
    }
}

impl ContentStore for GithubStore {
    fn get(&self, path: &str) -> Result<Option<RemoteObject>> {
        let url = self.contents_url(path);
        debug!("Looking up remote object {}", path);

        let response = self
            .with_headers(self.client.get(&url))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .map_err(|e| Error::StoreError(format!("Failed to reach {url}: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::StoreError(format!(
                "HTTP {} looking up {}",
                response.status(),
                path
            )));
        }

        let info: ContentInfo = response.json().map_err(|e| {
            Error::StoreError(format!("Invalid contents response for {path}: {e}"))
        })?;
        Ok(Some(RemoteObject {
            revision: info.sha,
            size: info.size,
        }))
    }

    fn create(&self, path: &str, content: &str, message: &str) -> Result<()> {
        self.put(
            path,
            &PutRequest {
                message,
                content: BASE64.encode(content),
                branch: &self.branch,
                sha: None,
            },
        )
    }

    fn update(&self, path: &str, content: &str, message: &str, revision: &str) -> Result<()> {
        self.put(
            path,
            &PutRequest {
                message,
                content: BASE64.encode(content),
                branch: &self.branch,
                sha: Some(revision),
            },
        )
    }
}
