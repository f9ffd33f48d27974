//! Program catalog assembly and search
//!
//! SR lists news programs on their own unpaginated `news` endpoint and all
//! other programs on the paginated `programs/index` endpoint. Some programs
//! show up on both, so the combined list is deduplicated by id, keeping the
//! first occurrence.

use crate::builder::build_programs;
use crate::cursor::{extract_records, PageQuery};
use crate::error::Result;
use crate::fetcher::{PageFetcher, QueryParams};
use crate::models::Program;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

/// Endpoint listing the regular programs (paginated)
pub const PROGRAMS_ENDPOINT: &str = "programs/index";

/// Endpoint listing the news programs (single page)
pub const NEWS_ENDPOINT: &str = "news";

/// Data key of both program endpoints
pub const PROGRAMS_KEY: &str = "programs";

/// Drop programs whose id was already seen, preserving order
pub fn dedupe_programs(programs: Vec<Program>) -> Vec<Program> {
    let mut seen = HashSet::with_capacity(programs.len());
    programs
        .into_iter()
        .filter(|program| seen.insert(program.id))
        .collect()
}

/// Raw records of the `news` endpoint
pub fn fetch_raw_news<F>(fetcher: &F) -> Result<Vec<Value>>
where
    F: PageFetcher + ?Sized,
{
    let mut params = QueryParams::new();
    params.insert("format".to_string(), "json".to_string());

    let body = fetcher.fetch(NEWS_ENDPOINT, &params)?;
    extract_records(body, NEWS_ENDPOINT, PROGRAMS_KEY)
}

/// Raw news records followed by every page of regular programs
///
/// This is the exact content of the program cache file.
pub fn fetch_raw_programs<F>(fetcher: &F, page_size: usize) -> Result<Vec<Value>>
where
    F: PageFetcher + ?Sized,
{
    let mut raw = fetch_raw_news(fetcher)?;
    let news_count = raw.len();

    raw.extend(PageQuery::new(PROGRAMS_ENDPOINT, PROGRAMS_KEY, page_size).collect_records(fetcher)?);

    debug!(
        news = news_count,
        regular = raw.len() - news_count,
        "Fetched raw programs"
    );
    Ok(raw)
}

/// Fetch news and regular programs and build a deduplicated catalog
pub fn assemble_catalog<F>(fetcher: &F, page_size: usize) -> Result<Catalog>
where
    F: PageFetcher + ?Sized,
{
    let raw = fetch_raw_programs(fetcher, page_size)?;
    Catalog::from_raw(&raw)
}

/// Deduplicated, ordered set of programs
///
/// Built once (from the API or the cache file) and then handed to
/// front-ends, which read it and refresh episodes of the programs they
/// display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    programs: Vec<Program>,
}

impl Catalog {
    /// Build a catalog, dropping duplicate ids
    pub fn from_programs(programs: Vec<Program>) -> Self {
        let total = programs.len();
        let programs = dedupe_programs(programs);
        info!(
            programs = programs.len(),
            duplicates = total - programs.len(),
            "Catalog assembled"
        );
        Self { programs }
    }

    /// Build a catalog from raw `programs` records
    pub fn from_raw(raw: &[Value]) -> Result<Self> {
        Ok(Self::from_programs(build_programs(raw)?))
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut Program> {
        self.programs.iter_mut().find(|p| p.id == id)
    }

    /// Programs whose name contains `query`, ignoring case, in catalog order
    ///
    /// The query is matched as plain text; escaping it for HTML is up to the
    /// caller.
    pub fn search(&self, query: &str) -> Vec<&Program> {
        self.programs.iter().filter(|p| p.matches(query)).collect()
    }

    /// Same as [`Catalog::search`], with mutable access for episode refresh
    pub fn search_mut(&mut self, query: &str) -> Vec<&mut Program> {
        self.programs
            .iter_mut()
            .filter(|p| p.matches(query))
            .collect()
    }

    pub fn into_programs(self) -> Vec<Program> {
        self.programs
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Program;
    type IntoIter = std::slice::Iter<'a, Program>;

    fn into_iter(self) -> Self::IntoIter {
        self.programs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::FakeFetcher;
    use serde_json::json;

    fn ids(programs: &[Program]) -> Vec<i64> {
        programs.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_dedupe_programs() {
        let programs = vec![
            Program::new(1, "fake program"),
            Program::new(1, "fake program"),
            Program::new(2, "fake program"),
        ];
        assert_eq!(dedupe_programs(programs).len(), 2);
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let programs = vec![
            Program::new(3, "first three"),
            Program::new(1, "first one"),
            Program::new(3, "second three"),
            Program::new(2, "two"),
            Program::new(1, "second one"),
        ];
        let deduped = dedupe_programs(programs);

        assert_eq!(ids(&deduped), vec![3, 1, 2]);
        assert_eq!(deduped[0].name, "first three");
        assert_eq!(deduped[1].name, "first one");
    }

    #[test]
    fn test_dedupe_ignores_names() {
        let deduped = dedupe_programs(vec![Program::new(7, "Ekot"), Program::new(7, "P1")]);
        assert_eq!(deduped, vec![Program::new(7, "Ekot")]);
    }

    fn catalog_fetcher() -> FakeFetcher {
        let mut fetcher = FakeFetcher::new();
        fetcher.add_single("news", json!({"programs": [{"id": 1, "name": "Ekot"}]}));
        fetcher.add_page(
            "programs/index",
            1,
            json!({"programs": [{"id": 1, "name": "Ekot"}, {"id": 2, "name": "P1"}]}),
        );
        fetcher.add_page("programs/index", 2, json!({"programs": []}));
        fetcher
    }

    #[test]
    fn test_assemble_catalog() {
        let fetcher = catalog_fetcher();
        let catalog = assemble_catalog(&fetcher, 10).unwrap();

        assert_eq!(
            catalog.programs(),
            &[Program::new(1, "Ekot"), Program::new(2, "P1")]
        );
    }

    #[test]
    fn test_news_request_is_unpaginated() {
        let fetcher = catalog_fetcher();
        assemble_catalog(&fetcher, 10).unwrap();

        let requests = fetcher.requests();
        let (endpoint, params) = &requests[0];
        assert_eq!(endpoint, "news");
        assert_eq!(params.len(), 1);
        assert_eq!(params["format"], "json");

        assert_eq!(fetcher.requested_pages("programs/index"), vec![1, 2]);
    }

    #[test]
    fn test_fetch_raw_programs_keeps_duplicates() {
        let fetcher = catalog_fetcher();
        let raw = fetch_raw_programs(&fetcher, 10).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0]["name"], "Ekot");
    }

    #[test]
    fn test_news_without_programs_key() {
        let mut fetcher = catalog_fetcher();
        fetcher.add_single("news", json!({"news": []}));

        assert!(matches!(
            assemble_catalog(&fetcher, 10),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_bad_record_fails_assembly() {
        let mut fetcher = catalog_fetcher();
        fetcher.add_page("programs/index", 1, json!({"programs": [{"id": 9}]}));

        assert!(matches!(
            assemble_catalog(&fetcher, 10),
            Err(Error::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_fetch_failure_fails_assembly() {
        let mut fetcher = FakeFetcher::new();
        fetcher.add_single("news", json!({"programs": []}));

        let err = assemble_catalog(&fetcher, 10).unwrap_err();
        assert!(err.is_fetch_failure());
    }

    #[test]
    fn test_search() {
        let mut catalog = Catalog::from_programs(vec![
            Program::new(1, "Ekot"),
            Program::new(2, "P1 Morgon"),
            Program::new(3, "P3 Morgon"),
        ]);

        let found: Vec<i64> = catalog.search("morgon").iter().map(|p| p.id).collect();
        assert_eq!(found, vec![2, 3]);
        assert_eq!(catalog.search("EKOT").len(), 1);
        assert!(catalog.search("P4").is_empty());
        assert!(catalog.search("").is_empty());

        for program in catalog.search_mut("p1") {
            program.name.push_str(" (live)");
        }
        assert_eq!(catalog.get(2).unwrap().name, "P1 Morgon (live)");
        assert!(catalog.get(9).is_none());
    }

    #[test]
    fn test_catalog_from_programs_dedupes() {
        let catalog = Catalog::from_programs(vec![Program::new(1, "a"), Program::new(1, "b")]);
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.is_empty());
        assert_eq!((&catalog).into_iter().count(), 1);
        assert_eq!(catalog.into_programs()[0].name, "a");
    }
}
