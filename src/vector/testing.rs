//! Deterministic embeddings for tests that must not download a model.

use super::embedding::EmbeddingGenerator;
use super::types::{VectorDimension, VectorError};

/// Hashes lowercase words (FNV-1a) into `dimension` buckets and counts them.
#[derive(Debug, Clone, Copy)]
pub struct BagOfWordsGenerator {
    dimension: VectorDimension,
}

impl BagOfWordsGenerator {
    pub fn new(dimension: usize) -> Result<Self, VectorError> {
        Ok(Self {
            dimension: VectorDimension::new(dimension)?,
        })
    }

    /// Boxed for APIs taking `Box<dyn EmbeddingGenerator>`.
    pub fn boxed(dimension: usize) -> Result<Box<dyn EmbeddingGenerator>, VectorError> {
        Ok(Box::new(Self::new(dimension)?))
    }
}

impl EmbeddingGenerator for BagOfWordsGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0; self.dimension.get()];
                for word in text.split_whitespace() {
                    let bucket = word
                        .to_lowercase()
                        .bytes()
                        .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
                    let len = v.len();
                    v[bucket as usize % len] += 1.0;
                }
                v
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            BagOfWordsGenerator::new(0),
            Err(VectorError::InvalidDimension { dimension: 0, .. })
        ));
    }

    #[test]
    fn test_word_case_is_ignored() {
        let generator = BagOfWordsGenerator::new(32).unwrap();
        let v = generator.generate_embeddings(&["Splice SITE", "splice site"]).unwrap();
        assert_eq!(v[0], v[1]);
        assert_eq!(v[0].iter().sum::<f32>(), 2.0);
    }
}
