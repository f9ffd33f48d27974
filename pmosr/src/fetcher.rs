//! Single-page HTTP fetching
//!
//! [`PageFetcher`] is the seam between the pagination logic and the
//! network: it performs exactly one GET and hands back the decoded JSON
//! body. [`HttpFetcher`] is the real implementation on top of `ureq`.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Default SR API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.sr.se/api/v2";

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "PMOMusic/0.3.10 (pmosr)";

/// Query parameters of one request, sorted by name
pub type QueryParams = BTreeMap<String, String>;

/// Fetch one page of an SR endpoint
pub trait PageFetcher {
    /// GET `endpoint` (relative to the API base, e.g. `"programs/index"`)
    /// with `params` and return the decoded JSON body.
    ///
    /// Transport errors, timeouts, non-2xx statuses and undecodable bodies
    /// are all errors; no retry is attempted.
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Value>;
}

impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Value> {
        (**self).fetch(endpoint, params)
    }
}

/// Build a `ureq` agent with a global timeout
pub fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Blocking `ureq` implementation of [`PageFetcher`]
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
    base_url: String,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher against `base_url`
    pub fn new(agent: Agent, base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            agent,
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an endpoint
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(
            build_agent(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            DEFAULT_BASE_URL,
            DEFAULT_USER_AGENT,
        )
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        let fetch_failure = |source: ureq::Error| Error::FetchFailure {
            endpoint: endpoint.to_string(),
            source,
        };

        debug!(%url, ?params, "Fetching SR page");

        let mut request = self
            .agent
            .get(&url)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "application/json");
        for (key, value) in params {
            request = request.query(key, value);
        }

        let mut response = request.call().map_err(fetch_failure)?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(fetch_failure)?;

        serde_json::from_str(&body).map_err(|source| Error::InvalidJson {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}
