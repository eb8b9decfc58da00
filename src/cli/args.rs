//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Research paper extraction and semantic search
#[derive(Parser, Debug)]
#[command(
    name = "splice",
    version = env!("CARGO_PKG_VERSION"),
    about = "Extract research papers from PDFs and search them semantically",
    long_about = "Extract text from PDF papers into JSON records, load them into a vector database and search by meaning.",
    after_help = "Quick Start:\n  $ splice init                          # Write .splice/settings.toml\n  $ splice extract                       # PDFs -> data/processed/*.json\n  $ splice setup                         # Load records, run the example query\n  $ splice search \"spliceosome\" -n 10    # Search the database",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .splice directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Extract text from PDFs
    #[command(
        about = "Extract PDF text into one JSON record per paper",
        after_help = "Examples:\n  splice extract\n  splice extract --input ~/papers --output data/processed"
    )]
    Extract {
        /// Directory containing PDF files (defaults to paths.papers_dir)
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Directory receiving JSON records (defaults to paths.processed_dir)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Populate the database and run an example query
    #[command(about = "Load extracted records into an empty database, then run an example query")]
    Setup {
        /// Query to run after loading (defaults to store.example_query)
        #[arg(short, long)]
        query: Option<String>,

        /// Results to show (defaults to store.example_results)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Semantic search
    #[command(
        about = "Search stored papers by meaning",
        after_help = "Examples:\n  splice search \"spliceosome programming\"\n  splice search \"exon skipping\" -n 10 --json"
    )]
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results (defaults to store.search_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Database statistics
    #[command(about = "Show paper count, collection name and database path")]
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from(["splice", "search", "exon skipping", "-n", "7", "--json"]);
        match cli.command {
            Commands::Search { query, limit, json } => {
                assert_eq!(query, "exon skipping");
                assert_eq!(limit, Some(7));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["splice", "stats", "--config", "custom.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Stats { json: false }));
    }
}
