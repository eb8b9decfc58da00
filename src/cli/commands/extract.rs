//! Extract command: PDFs to JSON records.

use std::path::PathBuf;

use crate::config::Settings;
use crate::extract::{ExtractProgress, PdfExtractor};

/// Run extract command.
pub fn run(input: Option<PathBuf>, output: Option<PathBuf>, config: &Settings) {
    let input = input.unwrap_or_else(|| config.paths.papers_dir.clone());
    let output = output.unwrap_or_else(|| config.paths.processed_dir.clone());

    let extractor = match PdfExtractor::new(&input, &output) {
        Ok(extractor) => extractor,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = extractor.process_directory_with_progress(|event| match event {
        ExtractProgress::Found { total } => println!("Found {total} PDF files"),
        ExtractProgress::Processing { path, .. } => {
            println!("Processing: {}", display_name(path));
        }
        ExtractProgress::Saved { output, .. } => println!("  Saved: {}", display_name(output)),
        ExtractProgress::Failed { error, .. } => println!("  Error: {error}"),
    });

    match result {
        Ok(outcome) => {
            println!("\nProcessed {} papers!", outcome.records.len());
            if !outcome.failures.is_empty() {
                println!("{} files could not be extracted", outcome.failures.len());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
