//! Prints the topic distribution of a publication table.
//!
//! Usage: `topic-report [path/to/publications.csv]` (defaults to the configured table).

use std::path::PathBuf;

use anyhow::Result;
use biocosmos::config::EngineConfig;
use biocosmos::ingest::load_table;
use biocosmos::{SearchIndex, TopicCategorizer};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = EngineConfig::load_default()?;
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.data.publications_path.clone());

    // Same table build and counting as the service, so the report matches /api/topics.
    let categorizer = TopicCategorizer::new(cfg.topics.clone());
    let counts = SearchIndex::new(load_table(&path, &categorizer)?).topic_distribution();

    println!("=== Topic Distribution ===");
    for c in &counts {
        println!("{}: {}", c.name, c.count);
    }
    println!("Total: {}", counts.iter().map(|c| c.count).sum::<usize>());
    Ok(())
}
