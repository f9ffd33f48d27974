//! Example: Search SR programs by name and show their latest episodes
//!
//! Run with: cargo run -p pmosr --example search_programs -- ekot
//! Or with more episodes: cargo run -p pmosr --example search_programs -- "p1 morgon" 3

use pmosr::{SrConfig, SverigesRadioClient};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (RUST_LOG=pmosr=debug for page-level traces)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SrConfig::load()?;

    let query = env::args().nth(1).unwrap_or_else(|| "ekot".to_string());
    let n_episodes = match env::args().nth(2) {
        Some(n) => n.parse()?,
        None => config.episodes.count,
    };

    let client = SverigesRadioClient::from_config(&config)?;
    let mut catalog = client.load_catalog(config.program_cache().as_ref())?;
    println!("Catalog: {} programs\n", catalog.len());

    let programs = client.search_with_episodes(&mut catalog, &query, n_episodes)?;
    println!("Found {} programs matching '{}':\n", programs.len(), query);

    for program in programs {
        println!("=== {} ({}) ===", program.name, program.id);

        if program.episodes.is_empty() {
            println!("  (no episodes)");
        }
        for episode in &program.episodes {
            println!("  {} [{}]", episode.title, episode.id);
            if episode.has_audio() {
                println!("    {}", episode.audio_url);
            } else {
                println!("    (no audio)");
            }
        }
        println!();
    }

    Ok(())
}
