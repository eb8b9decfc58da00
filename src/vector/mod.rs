//! Vector embeddings and their on-disk storage.

mod embedding;
mod storage;
mod types;

#[doc(hidden)]
pub mod testing;

pub use embedding::{EmbeddingGenerator, FastEmbedGenerator, SUPPORTED_MODELS, parse_model};
pub use storage::{MmapVectorStorage, VectorStorageError};
pub use types::{VectorDimension, VectorError, VectorId, cosine_similarity};
