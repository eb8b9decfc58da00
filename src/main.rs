use clap::Parser;
use std::path::Path;

use splice_papers::Settings;
use splice_papers::cli::commands;
use splice_papers::cli::{Cli, Commands};

/// Load settings and start logging, exiting on a configuration error.
fn load_config(path: Option<&Path>) -> Settings {
    let config = match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    splice_papers::logging::init_with_config(&config.logging);
    config
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => commands::init::run_init(force),
        Commands::Extract { input, output } => {
            commands::extract::run(input, output, &load_config(config_path));
        }
        Commands::Setup { query, limit } => {
            commands::setup::run(query, limit, &load_config(config_path));
        }
        Commands::Search { query, limit, json } => {
            commands::search::run(&query, limit, json, &load_config(config_path));
        }
        Commands::Stats { json } => commands::stats::run(json, &load_config(config_path)),
        Commands::Config => commands::init::run_config(&load_config(config_path)),
    }
}
