//! Search command implementation

use crate::envelope::{self, SearchData, SearchResult};
use crate::workspace::open_workspace;
use anyhow::Result;
use kbdelta_core::{readable_path, SearchHit};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub all: bool,
    pub limit: usize,
    pub json: bool,
}

/// Search string values of the working tree
pub async fn search_values(config_path: &Path, query: &str, opts: SearchOptions) -> Result<()> {
    let ws = open_workspace(config_path).await?;

    let hits = ws.session.search(query);
    let results: Vec<SearchHit> = if opts.all {
        hits.collect()
    } else {
        hits.unique_values().collect()
    };

    if opts.json {
        let payload = envelope::envelope(
            "search.results",
            SearchData {
                query: query.to_string(),
                limit: opts.limit,
                total: results.len(),
                results: results
                    .iter()
                    .take(opts.limit)
                    .map(|hit| SearchResult {
                        path: hit.path.to_string(),
                        location: readable_path(&hit.path),
                        value: hit.value.clone(),
                    })
                    .collect(),
            },
        );
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found for '{}'", query);
        return Ok(());
    }

    println!("\n🔍 Found {} results for '{}':\n", results.len(), query);
    for hit in results.iter().take(opts.limit) {
        println!("{}", hit.value);
        println!("  {}", readable_path(&hit.path));
        println!("  {}", hit.path);
        println!();
    }
    if results.len() > opts.limit {
        println!("  ... and {} more results", results.len() - opts.limit);
    }

    Ok(())
}
