//! Stats command.

use crate::config::Settings;

use super::{open_store_or_exit, print_json_or_exit};

/// Run stats command.
pub fn run(json: bool, config: &Settings) {
    let store = open_store_or_exit(config);
    let stats = store.stats();

    if json {
        print_json_or_exit(&stats);
    } else {
        println!("Collection: {}", stats.collection_name);
        println!("Papers:     {}", stats.total_papers);
        println!("Database:   {}", stats.db_path.display());
    }
}
