//! In-memory [`PageFetcher`] for unit tests

use crate::error::{Error, Result};
use crate::fetcher::{PageFetcher, QueryParams};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

/// Serves canned bodies keyed by endpoint and `page` parameter
///
/// Requests without a `page` parameter are looked up as page 0. Unknown
/// pages answer like an HTTP 404.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<(String, usize), Value>,
    requests: RefCell<Vec<(String, QueryParams)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, endpoint: &str, page: usize, body: Value) {
        self.pages.insert((endpoint.to_string(), page), body);
    }

    /// Body served for requests without a `page` parameter
    pub fn add_single(&mut self, endpoint: &str, body: Value) {
        self.add_page(endpoint, 0, body);
    }

    pub fn requests(&self) -> Vec<(String, QueryParams)> {
        self.requests.borrow().clone()
    }

    pub fn requested_pages(&self, endpoint: &str) -> Vec<usize> {
        self.requests
            .borrow()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, params)| page_of(params))
            .collect()
    }
}

fn page_of(params: &QueryParams) -> usize {
    params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0)
}

impl PageFetcher for FakeFetcher {
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Value> {
        self.requests
            .borrow_mut()
            .push((endpoint.to_string(), params.clone()));

        self.pages
            .get(&(endpoint.to_string(), page_of(params)))
            .cloned()
            .ok_or_else(|| Error::FetchFailure {
                endpoint: endpoint.to_string(),
                source: ureq::Error::StatusCode(404),
            })
    }
}
