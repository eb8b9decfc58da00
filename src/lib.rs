//! Research paper extraction and semantic search.
//!
//! PDFs are turned into JSON Document Records by [`extract`], loaded into a
//! persistent vector [`collection`] by [`store`], and searched by meaning.

pub mod cli;
pub mod collection;
pub mod config;
pub mod extract;
pub mod logging;
pub mod store;
pub mod vector;

pub use collection::{AddOutcome, Collection, CollectionError, Metadata, MetadataValue, QueryMatch};
pub use config::Settings;
pub use extract::{ExtractError, PaperRecord, PdfExtractor, derive_doc_id};
pub use store::{EntryMetadata, LoadSummary, PaperStore, StoreError, StoreStats, init_database};
pub use vector::{EmbeddingGenerator, FastEmbedGenerator};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
