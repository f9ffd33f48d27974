//! Sveriges Radio client library for PMOMusic
//!
//! This crate provides a blocking Rust client for the public Sveriges Radio
//! API (`https://api.sr.se/api/v2`): the program catalog, news programs and
//! the episodes of each program.
//!
//! # Features
//!
//! - **Pagination**: Page-by-page iteration over SR endpoints with an
//!   optional page limit ([`PageQuery`])
//! - **Catalog**: News and regular programs merged and deduplicated by id
//!   ([`Catalog`])
//! - **Episodes**: The latest episodes of a program with a playable audio
//!   URL resolved from the podcast file or the broadcast files
//! - **Program cache**: Optional JSON file holding the raw program list
//! - **Configuration**: YAML file with environment overrides ([`SrConfig`])
//!
//! # Example
//!
//! ```no_run
//! use pmosr::{SrConfig, SverigesRadioClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SrConfig::load()?;
//!     let client = SverigesRadioClient::from_config(&config)?;
//!
//!     // Built once, then searched as often as needed
//!     let mut catalog = client.load_catalog(config.program_cache().as_ref())?;
//!
//!     for program in client.search_with_episodes(&mut catalog, "P1", config.episodes.count)? {
//!         match program.latest_episode() {
//!             Some(episode) => println!("{}: {}", program.name, episode.title),
//!             None => println!("{}: no episodes", program.name),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Fetch failures and malformed responses abort the whole catalog or
//! episode operation; nothing is retried. A missing audio URL only logs a
//! warning and leaves [`Episode::audio_url`] empty.

pub mod builder;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod cursor;
pub mod episodes;
pub mod error;
pub mod fetcher;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use builder::{build_episode, build_program, coerce_id};
pub use cache::ProgramCache;
pub use catalog::{assemble_catalog, dedupe_programs, Catalog};
pub use client::{ClientBuilder, SverigesRadioClient};
pub use config::SrConfig;
pub use cursor::{pages_needed, PageQuery, Pages, DEFAULT_PAGE_SIZE};
pub use episodes::{fetch_episodes, refresh_episodes};
pub use error::{Error, Result};
pub use fetcher::{HttpFetcher, PageFetcher, QueryParams, DEFAULT_BASE_URL};
pub use models::{Episode, Program, ProgramRef};
