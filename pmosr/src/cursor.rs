//! Page-based iteration over SR endpoints
//!
//! SR paginates with a 1-based `page` parameter and signals the end of the
//! data with an empty array. A [`PageQuery`] describes what to fetch and is
//! a plain value; [`PageQuery::pages`] starts a fresh [`Pages`] iterator
//! every time it is called, so iteration state is never shared and a query
//! can be replayed from page 1 at will. A `Pages` iterator itself is
//! consume-once.
//!
//! ```no_run
//! use pmosr::{HttpFetcher, PageQuery};
//!
//! # fn main() -> pmosr::Result<()> {
//! let fetcher = HttpFetcher::default();
//! let query = PageQuery::new("programs/index", "programs", 10);
//! for page in query.pages(&fetcher) {
//!     println!("{} programs", page?.len());
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::fetcher::{PageFetcher, QueryParams};
use serde_json::Value;
use tracing::debug;

/// Default page size used by the SR API clients
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of pages of `page_size` items needed to hold `n_items` items
///
/// `floor((n - 1) / size) + 1` for `n >= 1`, and 0 for `n == 0`.
///
/// # Panics
///
/// Panics if `page_size` is 0.
pub fn pages_needed(n_items: usize, page_size: usize) -> usize {
    assert!(page_size > 0, "page size must be at least 1");
    match n_items {
        0 => 0,
        n => (n - 1) / page_size + 1,
    }
}

/// Description of a paginated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    endpoint: String,
    data_key: String,
    max_pages: Option<usize>,
    params: QueryParams,
}

impl PageQuery {
    /// Query `endpoint`, reading records from `data_key` in each page
    ///
    /// Default parameters are `format=json`, `pagination=true` and
    /// `size=page_size`.
    pub fn new(endpoint: impl Into<String>, data_key: impl Into<String>, page_size: usize) -> Self {
        let mut params = QueryParams::new();
        params.insert("format".to_string(), "json".to_string());
        params.insert("pagination".to_string(), "true".to_string());
        params.insert("size".to_string(), page_size.to_string());

        Self {
            endpoint: endpoint.into(),
            data_key: data_key.into(),
            max_pages: None,
            params,
        }
    }

    /// Stop after `max_pages` pages (unbounded by default)
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Add or override a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Add or override several query parameters
    pub fn params<K, V>(mut self, extra: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        for (key, value) in extra {
            self.params.insert(key.into(), value.to_string());
        }
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn data_key(&self) -> &str {
        &self.data_key
    }

    pub fn page_limit(&self) -> Option<usize> {
        self.max_pages
    }

    /// Query parameters without the `page` counter
    pub fn query_params(&self) -> &QueryParams {
        &self.params
    }

    /// Start iterating from page 1
    pub fn pages<'a, F>(&'a self, fetcher: &'a F) -> Pages<'a, F>
    where
        F: PageFetcher + ?Sized,
    {
        Pages {
            query: self,
            fetcher,
            page: 1,
            done: false,
        }
    }

    /// Fetch every page and flatten the records, in page then record order
    pub fn collect_records<F>(&self, fetcher: &F) -> Result<Vec<Value>>
    where
        F: PageFetcher + ?Sized,
    {
        let mut records = Vec::new();
        for page in self.pages(fetcher) {
            records.extend(page?);
        }
        Ok(records)
    }
}

/// Extract the record array stored under `key`
///
/// A missing key, or a value that is neither an array nor `null`, is a
/// [`Error::MalformedResponse`]. `null` reads as an empty page.
pub fn extract_records(body: Value, endpoint: &str, key: &str) -> Result<Vec<Value>> {
    let malformed = || Error::MalformedResponse {
        endpoint: endpoint.to_string(),
        key: key.to_string(),
    };

    match body {
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(records)) => Ok(records),
            Some(Value::Null) => Ok(Vec::new()),
            _ => Err(malformed()),
        },
        _ => Err(malformed()),
    }
}

/// Iterator over the pages of a [`PageQuery`]
///
/// Yields one `Vec` of raw records per page. Ends on the first empty page
/// or once the page limit is passed. Any error is yielded once and ends the
/// iteration.
pub struct Pages<'a, F: ?Sized> {
    query: &'a PageQuery,
    fetcher: &'a F,
    page: usize,
    done: bool,
}

impl<F: ?Sized> Pages<'_, F> {
    /// Number of the page the next advance would fetch
    pub fn next_page(&self) -> usize {
        self.page
    }
}

impl<F> Iterator for Pages<'_, F>
where
    F: PageFetcher + ?Sized,
{
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(max_pages) = self.query.max_pages {
            if self.page > max_pages {
                self.done = true;
                return None;
            }
        }

        let mut params = self.query.params.clone();
        params.insert("page".to_string(), self.page.to_string());

        let records = self
            .fetcher
            .fetch(&self.query.endpoint, &params)
            .and_then(|body| extract_records(body, &self.query.endpoint, &self.query.data_key));

        match records {
            Ok(records) if records.is_empty() => {
                debug!(
                    endpoint = %self.query.endpoint,
                    page = self.page,
                    "Empty page, end of data"
                );
                self.done = true;
                None
            }
            Ok(records) => {
                debug!(
                    endpoint = %self.query.endpoint,
                    page = self.page,
                    count = records.len(),
                    "Fetched page"
                );
                self.page += 1;
                Some(Ok(records))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<F> std::iter::FusedIterator for Pages<'_, F> where F: PageFetcher + ?Sized {}
