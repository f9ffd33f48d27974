//! Episode refresh for a single program

use crate::builder::build_episode;
use crate::cursor::{pages_needed, PageQuery};
use crate::error::{Error, Result};
use crate::fetcher::PageFetcher;
use crate::models::{Episode, Program};
use tracing::{debug, info};

/// Endpoint listing the episodes of a program (paginated)
pub const EPISODES_ENDPOINT: &str = "episodes/index";

/// Data key of the episodes endpoint
pub const EPISODES_KEY: &str = "episodes";

/// Default number of episodes fetched per refresh
pub const DEFAULT_EPISODE_COUNT: usize = 1;

/// Query for the newest episodes of `program_id`, bounded to the pages
/// needed for `n_episodes`
pub fn episodes_query(program_id: i64, n_episodes: usize, page_size: usize) -> PageQuery {
    PageQuery::new(EPISODES_ENDPOINT, EPISODES_KEY, page_size)
        .param("programid", program_id)
        .max_pages(pages_needed(n_episodes, page_size))
}

/// Fetch at most `n_episodes` episodes of `program_id`, newest first
///
/// Returns an empty vector when the program has no episodes.
pub fn fetch_episodes<F>(
    fetcher: &F,
    program_id: i64,
    n_episodes: usize,
    page_size: usize,
) -> Result<Vec<Episode>>
where
    F: PageFetcher + ?Sized,
{
    if n_episodes == 0 {
        return Err(Error::invalid_request("episode count must be at least 1"));
    }
    if page_size == 0 {
        return Err(Error::invalid_request("page size must be at least 1"));
    }

    let query = episodes_query(program_id, n_episodes, page_size);
    let mut episodes = Vec::with_capacity(n_episodes);

    for page in query.pages(fetcher) {
        for raw in page? {
            episodes.push(build_episode(&raw)?);
        }
    }

    debug!(
        program_id,
        fetched = episodes.len(),
        wanted = n_episodes,
        "Fetched episodes"
    );
    episodes.truncate(n_episodes);
    Ok(episodes)
}

/// Replace `program`'s episodes with its `n_episodes` newest ones
///
/// Fails with [`Error::NoEpisodesFound`] when SR returns none, in which case
/// the previously attached episodes are kept.
pub fn refresh_episodes<F>(
    fetcher: &F,
    program: &mut Program,
    n_episodes: usize,
    page_size: usize,
) -> Result<()>
where
    F: PageFetcher + ?Sized,
{
    let episodes = fetch_episodes(fetcher, program.id, n_episodes, page_size)?;
    if episodes.is_empty() {
        return Err(Error::NoEpisodesFound {
            program_id: program.id,
        });
    }

    info!(
        program_id = program.id,
        program = %program.name,
        episodes = episodes.len(),
        "Refreshed episodes"
    );
    program.set_episodes(episodes);
    Ok(())
}
