//! Blocking client for the Sveriges Radio API
//!
//! This module ties the pieces together: a [`PageFetcher`] (HTTP by
//! default), a page size, and the catalog/episode operations.
//!
//! # Example
//!
//! ```no_run
//! use pmosr::SverigesRadioClient;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SverigesRadioClient::new()?;
//!
//!     let mut catalog = client.assemble_catalog()?;
//!     println!("{} programs", catalog.len());
//!
//!     for program in client.search_with_episodes(&mut catalog, "ekot", 1)? {
//!         if let Some(episode) = program.latest_episode() {
//!             println!("{}: {} ({})", program.name, episode.title, episode.audio_url);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::cache::ProgramCache;
use crate::catalog::{self, Catalog};
use crate::config::SrConfig;
use crate::cursor::DEFAULT_PAGE_SIZE;
use crate::episodes;
use crate::error::{Error, Result};
use crate::fetcher::{
    build_agent, HttpFetcher, PageFetcher, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
use crate::models::{Episode, Program};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};
use ureq::Agent;

/// Sveriges Radio client
///
/// Stateless apart from its configuration: every call builds its own page
/// cursor, and the catalog it produces is owned by the caller.
#[derive(Debug, Clone)]
pub struct SverigesRadioClient<F = HttpFetcher> {
    fetcher: F,
    page_size: usize,
}

impl SverigesRadioClient<HttpFetcher> {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from a loaded configuration
    pub fn from_config(config: &SrConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }
}

impl<F: PageFetcher> SverigesRadioClient<F> {
    /// Create a client on top of any page fetcher
    pub fn with_fetcher(fetcher: F, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::invalid_request("page size must be at least 1"));
        }
        Ok(Self { fetcher, page_size })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Raw news and regular program records, duplicates included
    pub fn fetch_raw_programs(&self) -> Result<Vec<Value>> {
        catalog::fetch_raw_programs(&self.fetcher, self.page_size)
    }

    /// Fetch and deduplicate the whole program catalog
    pub fn assemble_catalog(&self) -> Result<Catalog> {
        catalog::assemble_catalog(&self.fetcher, self.page_size)
    }

    /// Build the catalog from `cache` when present, else from the API
    ///
    /// After a fetch, the raw records are written to `cache`.
    pub fn load_catalog(&self, cache: Option<&ProgramCache>) -> Result<Catalog> {
        let Some(cache) = cache else {
            return self.assemble_catalog();
        };

        if let Some(raw) = cache.load()? {
            return Catalog::from_raw(&raw);
        }

        info!(path = %cache.path().display(), "Program cache empty, fetching from API");
        let raw = self.fetch_raw_programs()?;
        cache.store(&raw)?;
        Catalog::from_raw(&raw)
    }

    // ========================================================================
    // Episodes
    // ========================================================================

    /// Fetch at most `n_episodes` episodes of a program, newest first
    pub fn fetch_episodes(&self, program_id: i64, n_episodes: usize) -> Result<Vec<Episode>> {
        episodes::fetch_episodes(&self.fetcher, program_id, n_episodes, self.page_size)
    }

    /// Attach the `n_episodes` newest episodes to `program`
    pub fn refresh_episodes(&self, program: &mut Program, n_episodes: usize) -> Result<()> {
        episodes::refresh_episodes(&self.fetcher, program, n_episodes, self.page_size)
    }

    /// Search the catalog and refresh the episodes of every match
    ///
    /// A match without episodes is logged and returned with whatever
    /// episodes it already had. Any other error aborts the search.
    pub fn search_with_episodes<'c>(
        &self,
        catalog: &'c mut Catalog,
        query: &str,
        n_episodes: usize,
    ) -> Result<Vec<&'c Program>> {
        let matches = catalog.search_mut(query);
        info!(query, matches = matches.len(), "Searching programs");

        for program in matches {
            match self.refresh_episodes(program, n_episodes) {
                Err(e @ Error::NoEpisodesFound { .. }) => {
                    warn!(program = %program.name, "{}", e);
                }
                other => other?,
            }
        }

        let catalog: &'c Catalog = catalog;
        Ok(catalog.search(query))
    }
}

/// Builder for configuring a SverigesRadioClient
pub struct ClientBuilder {
    agent: Option<Agent>,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    page_size: usize,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("custom_agent", &self.agent.is_some())
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            agent: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the `api` section of a configuration
    pub fn from_config(config: &SrConfig) -> Self {
        Self::default()
            .base_url(config.api.base_url.clone())
            .timeout(config.timeout())
            .user_agent(config.api.user_agent.clone())
            .page_size(config.api.page_size)
    }

    /// Set a custom `ureq` agent (the timeout setting is then ignored)
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the number of records requested per page
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<SverigesRadioClient> {
        let agent = self.agent.unwrap_or_else(|| build_agent(self.timeout));
        let fetcher = HttpFetcher::new(agent, self.base_url, self.user_agent);
        SverigesRadioClient::with_fetcher(fetcher, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;
    use serde_json::json;

    fn raw_episode(id: i64, program_id: i64) -> Value {
        json!({
            "id": id,
            "title": format!("episode {}", id),
            "description": "",
            "program": {"id": program_id, "name": "whatever"},
            "broadcast": {"broadcastfiles": [{"url": format!("http://sr.se/{}.m4a", id)}]},
        })
    }

    fn fake_sr() -> FakeFetcher {
        let mut fetcher = FakeFetcher::new();
        fetcher.add_single(
            "news",
            json!({"programs": [{"id": 1, "name": "Ekot"}, {"id": 3, "name": "Ekot Sport"}]}),
        );
        fetcher.add_page(
            "programs/index",
            1,
            json!({"programs": [{"id": 1, "name": "Ekot"}, {"id": 2, "name": "P1 Morgon"}]}),
        );
        fetcher.add_page("programs/index", 2, json!({"programs": []}));
        fetcher.add_page(
            "episodes/index",
            1,
            json!({"episodes": [raw_episode(11, 1), raw_episode(10, 1)]}),
        );
        fetcher
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();
        assert_eq!(builder.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            builder.timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert_eq!(builder.page_size, DEFAULT_PAGE_SIZE);

        let client = builder.build().unwrap();
        assert_eq!(client.fetcher().base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.page_size(), 10);
    }

    #[test]
    fn test_builder_from_config() {
        let config = SrConfig::from_yaml_str(
            "api:\n  base_url: http://localhost:9000\n  page_size: 30\n  timeout_secs: 5\n",
        )
        .unwrap();
        let builder = ClientBuilder::from_config(&config);
        assert_eq!(builder.timeout, Duration::from_secs(5));

        let client = builder.build().unwrap();
        assert_eq!(client.fetcher().base_url(), "http://localhost:9000");
        assert_eq!(client.page_size(), 30);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            ClientBuilder::new().page_size(0).build(),
            Err(Error::InvalidRequest(_))
        ));
        assert!(SverigesRadioClient::with_fetcher(FakeFetcher::new(), 0).is_err());
    }

    #[test]
    fn test_search_with_episodes() {
        let client = SverigesRadioClient::with_fetcher(fake_sr(), 10).unwrap();
        let mut catalog = client.assemble_catalog().unwrap();
        assert_eq!(catalog.len(), 3);

        let programs = client
            .search_with_episodes(&mut catalog, "ekot", 1)
            .unwrap();
        let ids: Vec<i64> = programs.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
        for program in &programs {
            assert_eq!(program.episodes.len(), 1);
            assert_eq!(program.latest_episode().unwrap().id, 11);
        }

        // non-matching programs are left alone
        assert!(catalog.get(2).unwrap().episodes.is_empty());
    }

    #[test]
    fn test_search_with_episodes_keeps_empty_programs() {
        let mut fetcher = fake_sr();
        fetcher.add_page("episodes/index", 1, json!({"episodes": []}));
        let client = SverigesRadioClient::with_fetcher(fetcher, 10).unwrap();

        let mut catalog = client.assemble_catalog().unwrap();
        let programs = client
            .search_with_episodes(&mut catalog, "morgon", 1)
            .unwrap();

        assert_eq!(programs.len(), 1);
        assert!(programs[0].latest_episode().is_none());
    }

    #[test]
    fn test_search_with_episodes_propagates_fetch_failure() {
        let mut fetcher = FakeFetcher::new();
        fetcher.add_single("news", json!({"programs": [{"id": 1, "name": "Ekot"}]}));
        fetcher.add_page("programs/index", 1, json!({"programs": []}));
        let client = SverigesRadioClient::with_fetcher(fetcher, 10).unwrap();

        let mut catalog = client.assemble_catalog().unwrap();
        let err = client
            .search_with_episodes(&mut catalog, "ekot", 1)
            .unwrap_err();
        assert!(err.is_fetch_failure());
    }

    #[test]
    fn test_refresh_through_client() {
        let client = SverigesRadioClient::with_fetcher(fake_sr(), 10).unwrap();
        let mut catalog = client.assemble_catalog().unwrap();

        let ekot = catalog.get_mut(1).unwrap();
        client.refresh_episodes(ekot, 1).unwrap();

        let latest = catalog.get(1).unwrap().latest_episode().unwrap();
        assert_eq!(latest.id, 11);
        assert_eq!(latest.audio_url, "http://sr.se/11.m4a");
        assert_eq!(client.fetch_episodes(1, 5).unwrap().len(), 2);
    }

    #[test]
    fn test_load_catalog_populates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProgramCache::new(dir.path().join("programs.json"));
        let client = SverigesRadioClient::with_fetcher(fake_sr(), 10).unwrap();

        let fetched = client.load_catalog(Some(&cache)).unwrap();
        let requests_after_fetch = client.fetcher().requests().len();
        assert_eq!(cache.load().unwrap().unwrap().len(), 4);

        let cached = client.load_catalog(Some(&cache)).unwrap();
        assert_eq!(cached, fetched);
        assert_eq!(client.fetcher().requests().len(), requests_after_fetch);
    }

    #[test]
    fn test_load_catalog_without_cache() {
        let client = SverigesRadioClient::with_fetcher(fake_sr(), 10).unwrap();
        let catalog = client.load_catalog(None).unwrap();
        let ids: Vec<i64> = catalog.programs().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }
}
