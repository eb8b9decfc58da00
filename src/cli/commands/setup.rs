//! Setup command: populate the database, then run the example query.

use crate::config::Settings;
use crate::store::{LoadProgress, init_database_with_progress};

use super::create_generator;
use super::search::print_results;

/// Run setup command.
pub fn run(query: Option<String>, limit: Option<usize>, config: &Settings) {
    println!("Initializing database at {}...", config.paths.db_path.display());

    let generator = match create_generator(config) {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let result = init_database_with_progress(config, generator, |event| match event {
        LoadProgress::Found { total } => {
            println!("Current papers in DB: 0");
            println!("\nLoading papers from processed JSONs...");
            println!("Found {total} processed papers");
        }
        LoadProgress::Added { path, .. } => println!("  Added: {}", path.display()),
        LoadProgress::Duplicate { doc_id, .. } => println!("  Skipped duplicate: {doc_id}"),
    });

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match outcome.loaded {
        Some(summary) => {
            println!("\nTotal papers in DB: {}", summary.total);
        }
        None => {
            println!("Current papers in DB: {}", outcome.store.count());
            println!("Database already populated!");
        }
    }

    let query = query.unwrap_or_else(|| config.store.example_query.clone());
    let limit = limit.unwrap_or(config.store.example_results);

    println!("\nTesting search...");
    match outcome.store.search(&query, limit) {
        Ok(results) => {
            println!("\nTop {limit} results for '{query}':");
            print_results(&results);
            println!("\nDatabase ready!");
        }
        Err(e) => {
            eprintln!("Search failed: {e}");
            std::process::exit(1);
        }
    }
}
