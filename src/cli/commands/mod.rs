//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod extract;
pub mod init;
pub mod search;
pub mod setup;
pub mod stats;

use serde::Serialize;

use crate::config::Settings;
use crate::store::PaperStore;
use crate::vector::{EmbeddingGenerator, FastEmbedGenerator};

/// Embedding generator for the configured model.
pub(crate) fn create_generator(config: &Settings) -> Result<Box<dyn EmbeddingGenerator>, String> {
    FastEmbedGenerator::from_settings(&config.store.model, config.store.show_download_progress)
        .map(|generator| Box::new(generator) as Box<dyn EmbeddingGenerator>)
        .map_err(|e| format!("Failed to create embedding generator: {e}"))
}

/// Open the configured store or exit with an error.
pub(crate) fn open_store_or_exit(config: &Settings) -> PaperStore {
    let opened = create_generator(config).and_then(|generator| {
        PaperStore::open_with_description(
            &config.paths.db_path,
            &config.store.collection_name,
            &config.store.collection_description,
            generator,
        )
        .map_err(|e| format!("Failed to open database: {e}"))
    });

    match opened {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Pretty JSON for `--json` output.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {e}"))
}

/// Print `value` as pretty JSON or exit with an error.
pub(crate) fn print_json_or_exit<T: Serialize>(value: &T) {
    match to_json(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
