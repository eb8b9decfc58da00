//! Type-safe wrappers for vector storage.

use std::num::{NonZeroU32, NonZeroUsize};
use thiserror::Error;

/// Errors in vector values themselves (as opposed to their storage).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension {dimension}: {reason}")]
    InvalidDimension { dimension: usize, reason: String },

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Unsupported embedding model: {0}")]
    UnsupportedModel(String),
}

/// Identifier of one stored vector. Zero is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VectorId(NonZeroU32);

impl VectorId {
    /// Create a VectorId, returning None for zero.
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Convert to bytes for storage (little-endian).
    pub fn to_bytes(&self) -> [u8; 4] {
        self.0.get().to_le_bytes()
    }

    /// Create from bytes (little-endian).
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        Self::new(u32::from_le_bytes(bytes))
    }
}

/// Number of components in every vector of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorDimension(NonZeroUsize);

impl VectorDimension {
    pub fn new(dimension: usize) -> Result<Self, VectorError> {
        NonZeroUsize::new(dimension)
            .map(Self)
            .ok_or_else(|| VectorError::InvalidDimension {
                dimension,
                reason: "dimension must be greater than zero".to_string(),
            })
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    /// Check that a vector has exactly this many components.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() == self.get() {
            Ok(())
        } else {
            Err(VectorError::DimensionMismatch {
                expected: self.get(),
                actual: vector.len(),
            })
        }
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
