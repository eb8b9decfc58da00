//! PDF text extraction.
//!
//! This module provides:
//! - Per-page text and Info-dictionary extraction through lopdf
//! - Normalisation into [`PaperRecord`] values
//! - Batch processing of a directory with per-file failure isolation

pub mod pdf;
pub mod record;

pub use pdf::{PdfContents, load_pdf};
pub use record::{DOC_ID_LEN, DocumentInfo, PageText, PaperMetadata, PaperRecord, derive_doc_id};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from extracting a single PDF or writing its record.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to load PDF {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("PDF is encrypted: {0}")]
    Encrypted(PathBuf),

    #[error("Path has no usable file name: {0}")]
    InvalidFileName(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to list PDF files: {0}")]
    Glob(#[from] glob::GlobError),
}

/// Progress events emitted while processing a directory.
#[derive(Debug, Clone)]
pub enum ExtractProgress<'a> {
    /// PDF files discovered in the input directory.
    Found { total: usize },
    /// About to extract a file.
    Processing { current: usize, total: usize, path: &'a Path },
    /// Record written.
    Saved { path: &'a Path, output: &'a Path },
    /// Extraction or write failed; the batch continues.
    Failed { path: &'a Path, error: &'a ExtractError },
}

/// A file that could not be extracted.
#[derive(Debug)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: ExtractError,
}

/// Result of one directory run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records extracted and written in this run.
    pub records: Vec<PaperRecord>,
    /// Files skipped because of an error.
    pub failures: Vec<FailedFile>,
}

/// Converts a directory of PDFs into JSON records.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl PdfExtractor {
    /// Create an extractor, making sure the output directory exists.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|source| ExtractError::Write {
            path: output_dir.clone(),
            source,
        })?;

        Ok(Self {
            input_dir,
            output_dir,
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Extract one PDF into a record. Nothing is written.
    pub fn extract_file(&self, path: &Path) -> Result<PaperRecord, ExtractError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ExtractError::InvalidFileName(path.to_path_buf()))?;

        let contents = load_pdf(path)?;
        let record = PaperRecord::from_pages(
            &filename,
            contents.page_count,
            contents.info,
            contents.page_texts,
        );

        tracing::debug!(
            target: "extract",
            "extracted {filename}: {} of {} pages with text",
            record.pages.len(),
            record.metadata.pages
        );

        Ok(record)
    }

    /// Extract any PDF path, independent of the configured input directory.
    pub fn extract_single(&self, path: impl AsRef<Path>) -> Result<PaperRecord, ExtractError> {
        self.extract_file(path.as_ref())
    }

    /// List `*.pdf` files directly inside the input directory.
    ///
    /// The extension match ignores case. A missing directory holds no files.
    pub fn pdf_files(&self) -> Result<Vec<PathBuf>, ExtractError> {
        if !self.input_dir.is_dir() {
            tracing::warn!(
                target: "extract",
                "input directory {} does not exist",
                self.input_dir.display()
            );
            return Ok(Vec::new());
        }

        let pattern = format!(
            "{}/*.pdf",
            glob::Pattern::escape(&self.input_dir.to_string_lossy())
        );
        let options = glob::MatchOptions {
            case_sensitive: false,
            ..glob::MatchOptions::new()
        };

        let mut files = Vec::new();
        for path in glob::glob_with(&pattern, options)? {
            let path = path?;
            if path.is_file() {
                files.push(path);
            }
        }

        Ok(files)
    }

    /// Process every PDF in the input directory.
    pub fn process_directory(&self) -> Result<BatchOutcome, ExtractError> {
        self.process_directory_with_progress(|_| {})
    }

    /// Process every PDF, reporting progress through `on_progress`.
    ///
    /// A failure on one file is logged and recorded in
    /// [`BatchOutcome::failures`]; the remaining files are still processed.
    /// Only a failure to list an existing input directory aborts the run.
    pub fn process_directory_with_progress<F>(&self, mut on_progress: F) -> Result<BatchOutcome, ExtractError>
    where
        F: FnMut(ExtractProgress<'_>),
    {
        let files = self.pdf_files()?;
        let total = files.len();
        on_progress(ExtractProgress::Found { total });
        tracing::info!(target: "extract", "found {total} PDF files in {}", self.input_dir.display());

        let mut outcome = BatchOutcome::default();

        for (idx, path) in files.into_iter().enumerate() {
            on_progress(ExtractProgress::Processing {
                current: idx + 1,
                total,
                path: &path,
            });

            let result = self
                .extract_file(&path)
                .and_then(|record| record.write_json(&self.output_dir).map(|out| (record, out)));

            match result {
                Ok((record, output)) => {
                    on_progress(ExtractProgress::Saved {
                        path: &path,
                        output: &output,
                    });
                    outcome.records.push(record);
                }
                Err(error) => {
                    tracing::warn!(target: "extract", "skipping {}: {error}", path.display());
                    on_progress(ExtractProgress::Failed {
                        path: &path,
                        error: &error,
                    });
                    outcome.failures.push(FailedFile { path, error });
                }
            }
        }

        tracing::info!(
            target: "extract",
            "extracted {} papers, {} failures",
            outcome.records.len(),
            outcome.failures.len()
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("processed/nested");
        let extractor = PdfExtractor::new(temp_dir.path(), &output).unwrap();
        assert!(output.is_dir());
        assert_eq!(extractor.output_dir(), output.as_path());
    }

    #[test]
    fn test_pdf_files_is_non_recursive_and_filters_extension() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("papers");
        std::fs::create_dir_all(input.join("sub")).unwrap();
        std::fs::write(input.join("a.pdf"), b"x").unwrap();
        std::fs::write(input.join("B.PDF"), b"x").unwrap();
        std::fs::write(input.join("notes.txt"), b"x").unwrap();
        std::fs::write(input.join("sub/c.pdf"), b"x").unwrap();

        let extractor = PdfExtractor::new(&input, temp_dir.path().join("out")).unwrap();
        let mut names: Vec<String> = extractor
            .pdf_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();

        assert_eq!(names, vec!["B.PDF".to_string(), "a.pdf".to_string()]);
    }

    #[test]
    fn test_pdf_files_escapes_glob_characters_in_input_dir() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("papers [2024]");
        std::fs::create_dir_all(input.join("folder.pdf")).unwrap();
        std::fs::write(input.join("paper.pdf"), b"x").unwrap();

        let extractor = PdfExtractor::new(&input, temp_dir.path().join("out")).unwrap();
        let files = extractor.pdf_files().unwrap();

        assert_eq!(files, vec![input.join("paper.pdf")]);
    }

    #[test]
    fn test_corrupt_file_does_not_abort_batch() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("papers");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("broken.pdf"), b"not a pdf at all").unwrap();
        std::fs::write(input.join("also-broken.pdf"), b"%PDF-1.4 truncated").unwrap();

        let extractor = PdfExtractor::new(&input, temp_dir.path().join("out")).unwrap();

        let mut failed_events = 0;
        let outcome = extractor
            .process_directory_with_progress(|event| {
                if matches!(event, ExtractProgress::Failed { .. }) {
                    failed_events += 1;
                }
            })
            .unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(failed_events, 2);
        assert_eq!(std::fs::read_dir(temp_dir.path().join("out")).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_input_dir_yields_empty_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let extractor =
            PdfExtractor::new(temp_dir.path().join("missing"), temp_dir.path().join("out")).unwrap();

        let mut found = None;
        let outcome = extractor
            .process_directory_with_progress(|event| {
                if let ExtractProgress::Found { total } = event {
                    found = Some(total);
                }
            })
            .unwrap();

        assert_eq!(found, Some(0));
        assert!(outcome.records.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_empty_input_dir() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = PdfExtractor::new(temp_dir.path(), temp_dir.path().join("out")).unwrap();
        let outcome = extractor.process_directory().unwrap();
        assert!(outcome.records.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
