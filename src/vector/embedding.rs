//! Embedding generation.
//!
//! [`EmbeddingGenerator`] is the seam between the collection and the model;
//! [`FastEmbedGenerator`] is the production implementation backed by a local
//! ONNX model through fastembed.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::types::{VectorDimension, VectorError};

/// Model names accepted by [`FastEmbedGenerator::from_settings`].
pub const SUPPORTED_MODELS: &[&str] = &[
    "AllMiniLML6V2",
    "AllMiniLML12V2",
    "BGESmallENV15",
    "BGEBaseENV15",
    "MultilingualE5Small",
    "NomicEmbedTextV15",
];

/// Turns text into fixed-dimension vectors.
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed a batch of texts; the output has one vector per input, in order.
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Dimension of every vector this generator produces.
    fn dimension(&self) -> VectorDimension;

    /// Identifier of the underlying model, persisted with the collection.
    fn model_name(&self) -> &str;
}

/// fastembed-backed generator.
pub struct FastEmbedGenerator {
    /// The embedding model (wrapped in Mutex for interior mutability)
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: VectorDimension,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Create a generator from a configured model name.
    ///
    /// The model is downloaded into the fastembed cache on first use.
    pub fn from_settings(model_name: &str, show_download_progress: bool) -> Result<Self, VectorError> {
        let model = parse_model(model_name)?;

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model).with_show_download_progress(show_download_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(format!("failed to initialise {model_name}: {e}")))?;

        // Probe the dimension with a throwaway embedding
        let probe = text_model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| VectorError::EmbeddingFailed(e.to_string()))?;
        let dimension = probe
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or_else(|| VectorError::EmbeddingFailed("model returned no embedding".to_string()))?;

        tracing::info!(target: "vector", "loaded embedding model {model_name} ({dimension} dims)");

        Ok(Self {
            model: Mutex::new(text_model),
            model_name: model_name.to_string(),
            dimension: VectorDimension::new(dimension)?,
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| VectorError::EmbeddingFailed(e.to_string()))?;

        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Map a configured name onto a fastembed model.
pub fn parse_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    let model = match name {
        "AllMiniLML6V2" => EmbeddingModel::AllMiniLML6V2,
        "AllMiniLML12V2" => EmbeddingModel::AllMiniLML12V2,
        "BGESmallENV15" => EmbeddingModel::BGESmallENV15,
        "BGEBaseENV15" => EmbeddingModel::BGEBaseENV15,
        "MultilingualE5Small" => EmbeddingModel::MultilingualE5Small,
        "NomicEmbedTextV15" => EmbeddingModel::NomicEmbedTextV15,
        other => return Err(VectorError::UnsupportedModel(other.to_string())),
    };
    Ok(model)
}
