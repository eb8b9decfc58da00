//! Search command.

use crate::collection::QueryMatch;
use crate::config::Settings;

use super::{open_store_or_exit, print_json_or_exit};

/// Run search command.
pub fn run(query: &str, limit: Option<usize>, json: bool, config: &Settings) {
    let store = open_store_or_exit(config);
    let limit = limit.unwrap_or(config.store.search_limit);

    match store.search(query, limit) {
        Ok(results) => {
            if json {
                print_json_or_exit(&results);
            } else if results.is_empty() {
                eprintln!("No results found.");
            } else {
                print_results(&results);
            }
        }
        Err(e) => {
            eprintln!("Search failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Numbered result list, closest first.
pub(crate) fn print_results(results: &[QueryMatch]) {
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {} (distance: {:.3})",
            i + 1,
            result.metadata_str("filename"),
            result.distance
        );
        let title = result.metadata_str("title");
        if !title.is_empty() {
            println!("   Title: {title}");
        }
    }
}
