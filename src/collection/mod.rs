//! Persistent, named vector collection.
//!
//! A collection owns everything below `<root>/<name>/`:
//! - `tantivy/` entry ids, text bodies and metadata
//! - `vectors/` one embedding per entry in a memory-mapped file
//! - `collection.json` name, description, model and dimension
//!
//! Callers hand in text; embedding, storage and nearest-neighbour ranking all
//! happen in here.

mod schema;

pub use schema::EntrySchema;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::directory::error::OpenDirectoryError;
use tantivy::query::TermQuery;
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{
    Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, TantivyDocument as Document, Term,
};
use thiserror::Error;

use crate::vector::{
    EmbeddingGenerator, MmapVectorStorage, VectorError, VectorId, VectorStorageError,
    cosine_similarity,
};

const INFO_FILE: &str = "collection.json";

/// Errors from collection operations.
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("Directory error: {0}")]
    Directory(#[from] OpenDirectoryError),

    #[error("Vector storage error: {0}")]
    VectorStorage(#[from] VectorStorageError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] VectorError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid collection name '{0}': use letters, digits, '_' or '-'")]
    InvalidName(String),

    #[error("Collection '{name}' stores {expected}-dimension vectors but the model produces {actual}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Int(i) => write!(f, "{i}"),
            MetadataValue::Float(x) => write!(f, "{x}"),
            MetadataValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

/// Metadata attached to an entry.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Outcome of [`Collection::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was stored.
    Inserted,
    /// An entry with this id already exists; nothing was written.
    Duplicate,
}

/// One nearest-neighbour match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMatch {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    /// Cosine distance to the query (0.0 identical, 2.0 opposite).
    pub distance: f32,
}

impl QueryMatch {
    /// String metadata value, or "" when absent or not a string.
    pub fn metadata_str(&self, key: &str) -> &str {
        self.metadata
            .get(key)
            .and_then(MetadataValue::as_str)
            .unwrap_or("")
    }
}

/// Persisted collection description.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionInfo {
    name: String,
    description: String,
    model: String,
    dimension: usize,
    created_at: u64,
}

/// A named collection of text entries with embeddings.
pub struct Collection {
    /// `<root>/<name>`
    path: PathBuf,
    info: CollectionInfo,
    index: Index,
    reader: IndexReader,
    schema: EntrySchema,
    /// Index writer (lazily created).
    writer: Option<IndexWriter<Document>>,
    vectors: MmapVectorStorage,
    generator: Box<dyn EmbeddingGenerator>,
    next_vector_id: u32,
    /// Tantivy heap size in bytes.
    heap_size: usize,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("path", &self.path)
            .field("name", &self.info.name)
            .field("model", &self.info.model)
            .field("dimension", &self.info.dimension)
            .field("next_vector_id", &self.next_vector_id)
            .finish()
    }
}

impl Collection {
    /// Open the collection `name` under `root`, creating it if needed.
    ///
    /// Reopening keeps existing entries and the original description.
    pub fn get_or_create(
        root: impl AsRef<Path>,
        name: &str,
        description: &str,
        generator: Box<dyn EmbeddingGenerator>,
    ) -> CollectionResult<Self> {
        validate_name(name)?;

        let path = root.as_ref().join(name);
        std::fs::create_dir_all(&path)?;

        let dimension = generator.dimension();
        let info = Self::load_or_init_info(&path, name, description, generator.as_ref())?;
        if info.dimension != dimension.get() {
            return Err(CollectionError::DimensionMismatch {
                name: name.to_string(),
                expected: info.dimension,
                actual: dimension.get(),
            });
        }
        if info.model != generator.model_name() {
            tracing::warn!(
                target: "collection",
                "collection '{name}' was built with {} but is opened with {}",
                info.model,
                generator.model_name()
            );
        }

        let index_path = path.join("tantivy");
        std::fs::create_dir_all(&index_path)?;
        let existing = index_path.join("meta.json").exists();

        let index = if existing {
            Index::open_in_dir(&index_path)?
        } else {
            let (tantivy_schema, _) = EntrySchema::build();
            let dir = MmapDirectory::open(&index_path)?;
            Index::create(dir, tantivy_schema, IndexSettings::default())?
        };
        let (_, schema) = EntrySchema::build();

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        if existing {
            reader.reload()?;
        }

        let vectors = MmapVectorStorage::open_or_create(path.join("vectors"), dimension)?;
        let next_vector_id = vectors.max_id().map_or(1, |id| id.get() + 1);

        let collection = Self {
            path,
            info,
            index,
            reader,
            schema,
            writer: None,
            vectors,
            generator,
            next_vector_id,
            heap_size: 50_000_000, // 50MB default
        };

        tracing::debug!(
            target: "collection",
            "opened collection '{name}' with {} entries",
            collection.count()
        );

        Ok(collection)
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn description(&self) -> &str {
        &self.info.description
    }

    /// Directory holding this collection's files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }

    /// Whether an entry with this id exists.
    pub fn contains(&self, id: &str) -> CollectionResult<bool> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.schema.entry_id, id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        Ok(searcher.search(&query, &Count)? > 0)
    }

    /// Insert one entry. The document text is embedded here.
    ///
    /// An existing id is left untouched and reported as
    /// [`AddOutcome::Duplicate`].
    pub fn add(&mut self, id: &str, document: &str, metadata: &Metadata) -> CollectionResult<AddOutcome> {
        if self.contains(id)? {
            tracing::warn!(
                target: "collection",
                "entry '{id}' already exists in '{}', ignoring insert",
                self.info.name
            );
            return Ok(AddOutcome::Duplicate);
        }

        let embedding = self
            .generator
            .generate_embeddings(&[document])?
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::EmbeddingFailed("no embedding generated".to_string()))?;

        let vector_id = self.allocate_vector_id()?;
        self.vectors
            .write_batch(&[(vector_id, embedding.as_slice())])?;

        let metadata_json = serde_json::to_string(metadata)?;
        let mut doc = Document::new();
        doc.add_text(self.schema.entry_id, id);
        doc.add_u64(self.schema.vector_id, vector_id.get() as u64);
        doc.add_text(self.schema.document, document);
        doc.add_text(self.schema.metadata, &metadata_json);
        doc.add_u64(self.schema.indexed_at, get_utc_timestamp());

        let writer = self.ensure_writer()?;
        writer.add_document(doc)?;
        writer.commit()?;
        self.reader.reload()?;

        tracing::debug!(target: "collection", "inserted '{id}' as vector {}", vector_id.get());
        Ok(AddOutcome::Inserted)
    }

    /// Nearest entries to `text`, closest first.
    pub fn query(&self, text: &str, n_results: usize) -> CollectionResult<Vec<QueryMatch>> {
        if n_results == 0 || self.count() == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self
            .generator
            .generate_embeddings(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::EmbeddingFailed("no embedding generated".to_string()))?;

        let mut scored: Vec<(VectorId, f32)> = self
            .vectors
            .read_all_vectors()
            .into_iter()
            .map(|(id, vector)| (id, 1.0 - cosine_similarity(&query_vec, &vector)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let searcher = self.reader.searcher();
        let mut matches = Vec::with_capacity(n_results);

        for (vector_id, distance) in scored {
            if matches.len() == n_results {
                break;
            }

            let term = Term::from_field_u64(self.schema.vector_id, vector_id.get() as u64);
            let query = TermQuery::new(term, IndexRecordOption::Basic);
            let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;

            // Vectors without a committed entry are leftovers of an interrupted insert
            let Some((_score, doc_address)) = top_docs.first() else {
                continue;
            };
            let doc: Document = searcher.doc(*doc_address)?;

            let text_field = |field| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };

            let metadata: Metadata =
                serde_json::from_str(&text_field(self.schema.metadata)).unwrap_or_default();

            matches.push(QueryMatch {
                id: text_field(self.schema.entry_id),
                document: text_field(self.schema.document),
                metadata,
                distance,
            });
        }

        Ok(matches)
    }

    fn allocate_vector_id(&mut self) -> CollectionResult<VectorId> {
        let id = VectorId::new(self.next_vector_id).ok_or_else(|| {
            VectorError::EmbeddingFailed("vector id space exhausted".to_string())
        })?;
        self.next_vector_id = self.next_vector_id.wrapping_add(1);
        Ok(id)
    }

    fn ensure_writer(&mut self) -> CollectionResult<&mut IndexWriter<Document>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.index.writer(self.heap_size)?,
        };
        Ok(self.writer.insert(writer))
    }

    fn load_or_init_info(
        path: &Path,
        name: &str,
        description: &str,
        generator: &dyn EmbeddingGenerator,
    ) -> CollectionResult<CollectionInfo> {
        let info_path = path.join(INFO_FILE);
        if info_path.exists() {
            let content = std::fs::read_to_string(&info_path)?;
            return Ok(serde_json::from_str(&content)?);
        }

        let info = CollectionInfo {
            name: name.to_string(),
            description: description.to_string(),
            model: generator.model_name().to_string(),
            dimension: generator.dimension().get(),
            created_at: get_utc_timestamp(),
        };
        std::fs::write(&info_path, serde_json::to_string_pretty(&info)?)?;
        tracing::info!(target: "collection", "created collection '{name}' at {}", path.display());

        Ok(info)
    }
}

fn validate_name(name: &str) -> CollectionResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CollectionError::InvalidName(name.to_string()))
    }
}

fn get_utc_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
