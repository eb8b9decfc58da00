//! Paper store: the extracted records inside a persistent collection.
//!
//! [`PaperStore`] is a thin layer over [`Collection`]. It maps Document Records
//! onto collection entries, bulk-loads the extractor's output directory and
//! passes searches straight through.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::collection::{AddOutcome, Collection, CollectionError, Metadata, QueryMatch};
use crate::config::Settings;
use crate::vector::EmbeddingGenerator;

/// Name of the collection holding all papers.
pub const DEFAULT_COLLECTION_NAME: &str = "splice_papers";

/// Description stored with a newly created collection.
pub const DEFAULT_COLLECTION_DESCRIPTION: &str = "mRNA papers for SPLICE agent";

/// Results returned by a search when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to initialise storage at {path}: {source}")]
    Init {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to list records: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed record {path}: {source}")]
    MalformedRecord {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Metadata kept with each stored paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub filename: String,
    pub title: String,
    pub author: String,
    pub pages: u32,
}

impl EntryMetadata {
    fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("filename".to_string(), self.filename.as_str().into());
        metadata.insert("title".to_string(), self.title.as_str().into());
        metadata.insert("author".to_string(), self.author.as_str().into());
        metadata.insert("pages".to_string(), i64::from(self.pages).into());
        metadata
    }
}

/// The fields of a Document Record the loader needs; all are required.
#[derive(Debug, Deserialize)]
struct LoadRecord {
    doc_id: String,
    full_text: String,
    metadata: EntryMetadata,
}

/// Progress events from a bulk load.
#[derive(Debug, Clone)]
pub enum LoadProgress<'a> {
    Found {
        total: usize,
    },
    Added {
        current: usize,
        total: usize,
        doc_id: &'a str,
        path: &'a Path,
    },
    /// The id was already stored; the collection kept the existing entry.
    Duplicate {
        current: usize,
        total: usize,
        doc_id: &'a str,
        path: &'a Path,
    },
}

/// Counts from one bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// JSON files found.
    pub found: usize,
    /// New entries inserted.
    pub added: usize,
    /// Records whose id was already stored.
    pub duplicates: usize,
    /// Entries in the collection afterwards.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_papers: usize,
    pub collection_name: String,
    pub db_path: PathBuf,
}

/// Persistent store of extracted papers.
#[derive(Debug)]
pub struct PaperStore {
    db_path: PathBuf,
    collection: Collection,
}

impl PaperStore {
    /// Open or create the store at `db_path`. Safe to call repeatedly.
    pub fn open(
        db_path: impl Into<PathBuf>,
        collection_name: &str,
        generator: Box<dyn EmbeddingGenerator>,
    ) -> StoreResult<Self> {
        Self::open_with_description(
            db_path,
            collection_name,
            DEFAULT_COLLECTION_DESCRIPTION,
            generator,
        )
    }

    /// Like [`open`](Self::open), with the description used when the
    /// collection is created.
    pub fn open_with_description(
        db_path: impl Into<PathBuf>,
        collection_name: &str,
        description: &str,
        generator: Box<dyn EmbeddingGenerator>,
    ) -> StoreResult<Self> {
        let db_path = db_path.into();
        std::fs::create_dir_all(&db_path).map_err(|source| StoreError::Init {
            path: db_path.clone(),
            source,
        })?;

        let collection = Collection::get_or_create(&db_path, collection_name, description, generator)?;
        tracing::info!(
            target: "store",
            "opened '{collection_name}' at {} ({} papers)",
            db_path.display(),
            collection.count()
        );

        Ok(Self {
            db_path,
            collection,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn count(&self) -> usize {
        self.collection.count()
    }

    /// Add one paper. Duplicate handling is left to the collection.
    pub fn add_paper(&mut self, doc_id: &str, text: &str, metadata: &EntryMetadata) -> StoreResult<AddOutcome> {
        let outcome = self.collection.add(doc_id, text, &metadata.to_metadata())?;
        tracing::debug!(target: "store", "add {doc_id} ({}): {outcome:?}", metadata.filename);
        Ok(outcome)
    }

    /// Load every `*.json` record in `dir`.
    pub fn add_papers_from_dir(&mut self, dir: impl AsRef<Path>) -> StoreResult<LoadSummary> {
        self.add_papers_from_dir_with_progress(dir, |_| {})
    }

    /// Load every `*.json` record in `dir`, reporting each file.
    ///
    /// Stops at the first unreadable or malformed record. Papers added before
    /// that point stay stored. A missing directory holds no records.
    pub fn add_papers_from_dir_with_progress<F>(
        &mut self,
        dir: impl AsRef<Path>,
        mut on_progress: F,
    ) -> StoreResult<LoadSummary>
    where
        F: FnMut(LoadProgress<'_>),
    {
        let dir = dir.as_ref();
        let files = if dir.is_dir() {
            let pattern = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));
            glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?
        } else {
            tracing::warn!(target: "store", "records directory {} does not exist", dir.display());
            Vec::new()
        };

        let total = files.len();
        on_progress(LoadProgress::Found { total });

        let mut summary = LoadSummary {
            found: total,
            ..LoadSummary::default()
        };

        for (idx, path) in files.iter().enumerate() {
            let record = read_load_record(path)?;
            let current = idx + 1;

            match self.add_paper(&record.doc_id, &record.full_text, &record.metadata)? {
                AddOutcome::Inserted => {
                    summary.added += 1;
                    on_progress(LoadProgress::Added {
                        current,
                        total,
                        doc_id: &record.doc_id,
                        path,
                    });
                }
                AddOutcome::Duplicate => {
                    summary.duplicates += 1;
                    on_progress(LoadProgress::Duplicate {
                        current,
                        total,
                        doc_id: &record.doc_id,
                        path,
                    });
                }
            }
        }

        summary.total = self.count();
        tracing::info!(
            target: "store",
            "loaded {} of {} records from {}, {} papers stored",
            summary.added,
            summary.found,
            dir.display(),
            summary.total
        );

        Ok(summary)
    }

    /// Nearest papers to `query`, closest first.
    pub fn search(&self, query: &str, limit: usize) -> StoreResult<Vec<QueryMatch>> {
        Ok(self.collection.query(query, limit)?)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_papers: self.count(),
            collection_name: self.collection.name().to_string(),
            db_path: self.db_path.clone(),
        }
    }
}

fn read_load_record(path: &Path) -> StoreResult<LoadRecord> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::MalformedRecord {
        path: path.to_path_buf(),
        source,
    })
}

/// Result of [`init_database`].
#[derive(Debug)]
pub struct InitOutcome {
    pub store: PaperStore,
    /// `None` when the collection already held papers and nothing was loaded.
    pub loaded: Option<LoadSummary>,
}

/// Open the configured store and populate it from the processed directory
/// when it is empty.
pub fn init_database(settings: &Settings, generator: Box<dyn EmbeddingGenerator>) -> StoreResult<InitOutcome> {
    init_database_with_progress(settings, generator, |_| {})
}

pub fn init_database_with_progress<F>(
    settings: &Settings,
    generator: Box<dyn EmbeddingGenerator>,
    on_progress: F,
) -> StoreResult<InitOutcome>
where
    F: FnMut(LoadProgress<'_>),
{
    let mut store = PaperStore::open_with_description(
        &settings.paths.db_path,
        &settings.store.collection_name,
        &settings.store.collection_description,
        generator,
    )?;

    if store.count() > 0 {
        tracing::info!(target: "store", "database already populated with {} papers", store.count());
        return Ok(InitOutcome {
            store,
            loaded: None,
        });
    }

    let summary = store.add_papers_from_dir_with_progress(&settings.paths.processed_dir, on_progress)?;
    Ok(InitOutcome {
        store,
        loaded: Some(summary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DocumentInfo, PaperRecord};
    use crate::vector::testing::BagOfWordsGenerator;
    use tempfile::TempDir;

    fn generator() -> Box<dyn EmbeddingGenerator> {
        BagOfWordsGenerator::boxed(64).unwrap()
    }

    fn write_record(dir: &Path, filename: &str, pages: &[&str]) -> PaperRecord {
        let info = DocumentInfo {
            title: format!("Title of {filename}"),
            author: "A. Author".to_string(),
            subject: String::new(),
        };
        let record = PaperRecord::from_pages(filename, pages.len() as u32, info, pages.iter().copied());
        record.write_json(dir).unwrap();
        record
    }

    fn settings_in(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.paths.processed_dir = root.join("processed");
        settings.paths.db_path = root.join("vector_db");
        settings
    }

    #[test]
    fn test_search_empty_collection_returns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = PaperStore::open(temp_dir.path(), DEFAULT_COLLECTION_NAME, generator()).unwrap();
        assert_eq!(store.count(), 0);
        assert!(store.search("spliceosome", 3).unwrap().is_empty());
    }

    #[test]
    fn test_add_paper_and_search() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = PaperStore::open(temp_dir.path(), DEFAULT_COLLECTION_NAME, generator()).unwrap();

        let metadata = EntryMetadata {
            filename: "rna.pdf".to_string(),
            title: "Splicing".to_string(),
            author: "Someone".to_string(),
            pages: 12,
        };
        let outcome = store
            .add_paper("abc123def456", "spliceosome programming in cells", &metadata)
            .unwrap();
        assert_eq!(outcome, AddOutcome::Inserted);

        let results = store.search("spliceosome programming", DEFAULT_SEARCH_LIMIT).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "abc123def456");
        assert_eq!(results[0].metadata_str("title"), "Splicing");
        assert_eq!(results[0].metadata.get("pages").and_then(|v| v.as_i64()), Some(12));
    }

    #[test]
    fn test_bulk_load_reports_progress() {
        let temp_dir = TempDir::new().unwrap();
        let processed = temp_dir.path().join("processed");
        std::fs::create_dir_all(&processed).unwrap();
        write_record(&processed, "one.pdf", &["alpha beta"]);
        write_record(&processed, "two.pdf", &["gamma", "", "delta"]);
        std::fs::write(processed.join("notes.txt"), "ignored").unwrap();

        let mut store = PaperStore::open(temp_dir.path().join("db"), DEFAULT_COLLECTION_NAME, generator()).unwrap();

        let mut added = Vec::new();
        let summary = store
            .add_papers_from_dir_with_progress(&processed, |event| {
                if let LoadProgress::Added { current, total, .. } = event {
                    added.push((current, total));
                }
            })
            .unwrap();

        assert_eq!(
            summary,
            LoadSummary {
                found: 2,
                added: 2,
                duplicates: 0,
                total: 2
            }
        );
        assert_eq!(added, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_malformed_record_aborts_but_keeps_earlier_inserts() {
        let temp_dir = TempDir::new().unwrap();
        let processed = temp_dir.path().join("processed");
        std::fs::create_dir_all(&processed).unwrap();

        // glob yields paths in sorted order, so "a" is loaded before "b"
        let good = write_record(&processed, "good.pdf", &["splicing factors"]);
        std::fs::rename(
            processed.join(good.json_filename()),
            processed.join("a.json"),
        )
        .unwrap();
        std::fs::write(
            processed.join("b.json"),
            r#"{"doc_id": "bad", "metadata": {"filename": "bad.pdf", "title": "", "author": "", "pages": 1}}"#,
        )
        .unwrap();

        let mut store = PaperStore::open(temp_dir.path().join("db"), DEFAULT_COLLECTION_NAME, generator()).unwrap();
        let result = store.add_papers_from_dir(&processed);

        match result {
            Err(StoreError::MalformedRecord { path, .. }) => assert!(path.ends_with("b.json")),
            other => panic!("expected malformed record error, got {other:?}"),
        }
        assert_eq!(store.count(), 1);
        assert!(store.collection().contains(&good.doc_id).unwrap());
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = PaperStore::open(temp_dir.path().join("db"), DEFAULT_COLLECTION_NAME, generator()).unwrap();

        let mut found = None;
        let summary = store
            .add_papers_from_dir_with_progress(temp_dir.path().join("nope"), |event| {
                if let LoadProgress::Found { total } = event {
                    found = Some(total);
                }
            })
            .unwrap();

        assert_eq!(summary, LoadSummary::default());
        assert_eq!(found, Some(0));
    }

    #[test]
    fn test_init_database_without_processed_dir() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings_in(temp_dir.path());

        let outcome = init_database(&settings, generator()).unwrap();
        assert!(matches!(
            outcome.loaded,
            Some(LoadSummary {
                found: 0,
                added: 0,
                total: 0,
                ..
            })
        ));
        assert!(outcome.store.search("spliceosome programming", 3).unwrap().is_empty());
    }

    #[test]
    fn test_unwritable_path_is_init_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain-file");
        std::fs::write(&file, "x").unwrap();

        let result = PaperStore::open(file.join("db"), DEFAULT_COLLECTION_NAME, generator());
        assert!(matches!(result, Err(StoreError::Init { .. })));
    }

    #[test]
    fn test_init_database_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings_in(temp_dir.path());
        std::fs::create_dir_all(&settings.paths.processed_dir).unwrap();
        write_record(&settings.paths.processed_dir, "one.pdf", &["first paper"]);
        write_record(&settings.paths.processed_dir, "two.pdf", &["second paper"]);

        let first = init_database(&settings, generator()).unwrap();
        assert_eq!(first.loaded.map(|s| s.added), Some(2));
        assert_eq!(first.store.count(), 2);
        drop(first);

        let second = init_database(&settings, generator()).unwrap();
        assert!(second.loaded.is_none());
        assert_eq!(second.store.count(), 2);
    }

    #[test]
    fn test_reloading_same_directory_adds_no_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let processed = temp_dir.path().join("processed");
        std::fs::create_dir_all(&processed).unwrap();
        write_record(&processed, "one.pdf", &["text"]);

        let mut store = PaperStore::open(temp_dir.path().join("db"), DEFAULT_COLLECTION_NAME, generator()).unwrap();
        store.add_papers_from_dir(&processed).unwrap();
        let summary = store.add_papers_from_dir(&processed).unwrap();

        assert_eq!(summary.added, 0);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.total, 1);
    }

    #[test]
    fn test_stats() {
        let temp_dir = TempDir::new().unwrap();
        let store = PaperStore::open(temp_dir.path(), "my_papers", generator()).unwrap();
        let stats = store.stats();
        assert_eq!(stats.total_papers, 0);
        assert_eq!(stats.collection_name, "my_papers");
        assert_eq!(stats.db_path, temp_dir.path());
    }
}
