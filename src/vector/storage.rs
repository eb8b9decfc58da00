//! Memory-mapped vector file.
//!
//! Layout of `segment_0.vec`:
//!
//! ```text
//! [magic "SPVC"][version u32][dimension u32][reserved u32]
//! [id u32][f32 x dimension] ...
//! ```
//!
//! All integers and floats are little-endian. Records are append-only; a
//! later record with the same id shadows an earlier one.

use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::{VectorDimension, VectorError, VectorId};

const SEGMENT_FILE: &str = "segment_0.vec";
const MAGIC: &[u8; 4] = b"SPVC";
const FORMAT_VERSION: u32 = 1;
const HEADER_SIZE: usize = 16;

/// Errors from reading or writing the vector file.
#[derive(Error, Debug)]
pub enum VectorStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    #[error("Invalid vector file {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },
}

/// Append-only vector storage backed by a memory-mapped file.
#[derive(Debug)]
pub struct MmapVectorStorage {
    path: PathBuf,
    dimension: VectorDimension,
    mmap: Mmap,
    /// Byte offset of the latest record for each id.
    offsets: HashMap<VectorId, usize>,
    /// Ids in first-write order.
    order: Vec<VectorId>,
}

impl MmapVectorStorage {
    /// Open the vector file in `dir`, creating it for `dimension` if absent.
    ///
    /// Fails with a dimension mismatch when the existing file was created for
    /// a different dimension.
    pub fn open_or_create(dir: impl AsRef<Path>, dimension: VectorDimension) -> Result<Self, VectorStorageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(SEGMENT_FILE);

        if !path.exists() {
            let mut file = File::create(&path)?;
            let mut header = Vec::with_capacity(HEADER_SIZE);
            header.extend_from_slice(MAGIC);
            header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
            header.extend_from_slice(&(dimension.get() as u32).to_le_bytes());
            header.extend_from_slice(&0u32.to_le_bytes());
            file.write_all(&header)?;
            file.sync_all()?;
            tracing::debug!(target: "vector", "created vector file {}", path.display());
        }

        let storage = Self::open(dir)?;
        if storage.dimension != dimension {
            return Err(VectorError::DimensionMismatch {
                expected: storage.dimension.get(),
                actual: dimension.get(),
            }
            .into());
        }

        Ok(storage)
    }

    /// Open an existing vector file in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, VectorStorageError> {
        let path = dir.as_ref().join(SEGMENT_FILE);
        let file = File::open(&path)?;
        // SAFETY: the file is only ever appended to by this process while mapped,
        // and the map is replaced after every append.
        let mmap = unsafe { Mmap::map(&file)? };

        let dimension = Self::read_header(&path, &mmap)?;
        let mut storage = Self {
            path,
            dimension,
            mmap,
            offsets: HashMap::new(),
            order: Vec::new(),
        };
        storage.rebuild_index();

        Ok(storage)
    }

    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// Number of distinct vector ids stored.
    pub fn vector_count(&self) -> usize {
        self.order.len()
    }

    /// Highest id stored, if any.
    pub fn max_id(&self) -> Option<VectorId> {
        self.order.iter().copied().max()
    }

    /// Append a batch of vectors and flush them to disk.
    ///
    /// The whole batch is validated before anything is written.
    pub fn write_batch(&mut self, vectors: &[(VectorId, &[f32])]) -> Result<(), VectorStorageError> {
        if vectors.is_empty() {
            return Ok(());
        }

        for (_, vector) in vectors {
            self.dimension.validate_vector(vector)?;
        }

        let mut buffer = Vec::with_capacity(vectors.len() * self.record_size());
        for (id, vector) in vectors {
            buffer.extend_from_slice(&id.to_bytes());
            for value in *vector {
                buffer.extend_from_slice(&value.to_le_bytes());
            }
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(&buffer)?;
        file.sync_data()?;

        let file = File::open(&self.path)?;
        // SAFETY: see `open`.
        self.mmap = unsafe { Mmap::map(&file)? };
        self.rebuild_index();

        Ok(())
    }

    /// Read one vector by id.
    pub fn read_vector(&self, id: VectorId) -> Option<Vec<f32>> {
        self.offsets.get(&id).map(|&offset| self.decode_vector(offset))
    }

    /// Read every vector in first-write order.
    pub fn read_all_vectors(&self) -> Vec<(VectorId, Vec<f32>)> {
        self.order
            .iter()
            .filter_map(|id| self.read_vector(*id).map(|v| (*id, v)))
            .collect()
    }

    fn record_size(&self) -> usize {
        4 + 4 * self.dimension.get()
    }

    fn read_header(path: &Path, bytes: &[u8]) -> Result<VectorDimension, VectorStorageError> {
        let invalid = |reason: &str| VectorStorageError::InvalidFormat {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if bytes.len() < HEADER_SIZE {
            return Err(invalid("file shorter than header"));
        }
        if &bytes[0..4] != MAGIC {
            return Err(invalid("bad magic"));
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != FORMAT_VERSION {
            return Err(invalid(&format!("unsupported version {version}")));
        }

        let dimension = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        Ok(VectorDimension::new(dimension)?)
    }

    fn rebuild_index(&mut self) {
        self.offsets.clear();
        self.order.clear();

        let record_size = self.record_size();
        let body_len = self.mmap.len().saturating_sub(HEADER_SIZE);
        if body_len % record_size != 0 {
            tracing::warn!(
                target: "vector",
                "ignoring partial trailing record in {}",
                self.path.display()
            );
        }

        for record in 0..body_len / record_size {
            let offset = HEADER_SIZE + record * record_size;
            let id_bytes = [
                self.mmap[offset],
                self.mmap[offset + 1],
                self.mmap[offset + 2],
                self.mmap[offset + 3],
            ];
            let Some(id) = VectorId::from_bytes(id_bytes) else {
                continue;
            };
            if self.offsets.insert(id, offset).is_none() {
                self.order.push(id);
            }
        }
    }

    fn decode_vector(&self, offset: usize) -> Vec<f32> {
        let start = offset + 4;
        let end = start + 4 * self.dimension.get();
        self.mmap[start..end]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }
}
