//! Vector Index
//!
//! HNSW index over startup embeddings, keyed by startup id. Uses USearch as
//! the ANN provider; this module only wraps it with id mapping, wholesale
//! builds, and snapshot persistence.
//!
//! Vectors are unit-normalized before they get here, so cosine distance and
//! inner product agree. An empty index answers queries with an empty list,
//! never an error.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

// ============================================================================
// CONSTANTS
// ============================================================================

/// HNSW connectivity parameter (higher = better recall, more memory)
pub const DEFAULT_CONNECTIVITY: usize = 16;

/// HNSW expansion factor for index building
pub const DEFAULT_EXPANSION_ADD: usize = 128;

/// HNSW expansion factor for search (higher = better recall, slower)
pub const DEFAULT_EXPANSION_SEARCH: usize = 64;

/// Opaque USearch blob inside a snapshot directory
const INDEX_FILE: &str = "vectors.usearch";

/// Sidecar record validating blob compatibility on load
const SIDECAR_FILE: &str = "vectors.json";

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Vector index error types
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum VectorIndexError {
    /// Failed to create the underlying index
    IndexCreation(String),
    /// Failed to add a vector
    IndexAdd(String),
    /// Failed to search
    IndexSearch(String),
    /// Failed to persist the index
    IndexPersistence(String),
    /// Dimension mismatch (expected, got)
    InvalidDimensions(usize, usize),
    /// Vector and id slices of different lengths (vectors, ids)
    LengthMismatch(usize, usize),
}

impl std::fmt::Display for VectorIndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorIndexError::IndexCreation(e) => write!(f, "Index creation failed: {}", e),
            VectorIndexError::IndexAdd(e) => write!(f, "Failed to add vector: {}", e),
            VectorIndexError::IndexSearch(e) => write!(f, "Search failed: {}", e),
            VectorIndexError::IndexPersistence(e) => write!(f, "Persistence failed: {}", e),
            VectorIndexError::InvalidDimensions(expected, got) => {
                write!(f, "Invalid dimensions: expected {}, got {}", expected, got)
            }
            VectorIndexError::LengthMismatch(vectors, ids) => {
                write!(f, "Got {} vectors for {} ids", vectors, ids)
            }
        }
    }
}

impl std::error::Error for VectorIndexError {}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the vector index
#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    /// Number of dimensions; must match the embedding provider
    pub dimensions: usize,
    /// HNSW connectivity parameter
    pub connectivity: usize,
    /// Expansion factor for adding vectors
    pub expansion_add: usize,
    /// Expansion factor for searching
    pub expansion_search: usize,
}

impl VectorIndexConfig {
    /// Config with the given dimensions and default HNSW parameters.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            connectivity: DEFAULT_CONNECTIVITY,
            expansion_add: DEFAULT_EXPANSION_ADD,
            expansion_search: DEFAULT_EXPANSION_SEARCH,
        }
    }

    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            dimensions: self.dimensions,
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            connectivity: self.connectivity,
            expansion_add: self.expansion_add,
            expansion_search: self.expansion_search,
            multi: false,
        }
    }
}

/// Index statistics
#[derive(Debug, Clone, Serialize)]
pub struct VectorIndexStats {
    /// Total number of vectors
    pub total_vectors: usize,
    /// Vector dimensions
    pub dimensions: usize,
}

/// Sidecar record written next to the opaque index blob.
/// On load, a dimension or count mismatch means "no usable snapshot".
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexSidecar {
    document_ids: Vec<i64>,
    embedding_dimension: usize,
    count: usize,
    built_at: DateTime<Utc>,
}

// ============================================================================
// VECTOR INDEX
// ============================================================================

/// HNSW vector index keyed by startup id.
pub struct VectorIndex {
    index: Index,
    config: VectorIndexConfig,
    /// Indexed ids in insertion order, echoed into the sidecar
    ids: Vec<i64>,
    built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Create an empty index. Searches against it return no candidates.
    pub fn empty(config: VectorIndexConfig) -> Result<Self, VectorIndexError> {
        let index = Index::new(&config.index_options())
            .map_err(|e| VectorIndexError::IndexCreation(e.to_string()))?;
        Ok(Self {
            index,
            config,
            ids: Vec::new(),
            built_at: Utc::now(),
        })
    }

    /// Build an index wholesale from parallel vector/id slices.
    ///
    /// This always constructs a fresh index; replacing a live one is the
    /// engine's snapshot swap, not an in-place mutation here.
    pub fn build(
        config: VectorIndexConfig,
        vectors: &[Vec<f32>],
        ids: &[i64],
    ) -> Result<Self, VectorIndexError> {
        if vectors.len() != ids.len() {
            return Err(VectorIndexError::LengthMismatch(vectors.len(), ids.len()));
        }

        let built = Self::empty(config)?;

        // usearch requires reserve() before add()
        built
            .index
            .reserve(vectors.len())
            .map_err(|e| VectorIndexError::IndexCreation(e.to_string()))?;

        let mut indexed_ids = Vec::with_capacity(ids.len());
        for (vector, &id) in vectors.iter().zip(ids.iter()) {
            if vector.len() != built.config.dimensions {
                return Err(VectorIndexError::InvalidDimensions(
                    built.config.dimensions,
                    vector.len(),
                ));
            }
            built
                .index
                .add(id as u64, vector)
                .map_err(|e| VectorIndexError::IndexAdd(e.to_string()))?;
            indexed_ids.push(id);
        }

        tracing::info!(
            vectors = indexed_ids.len(),
            dimensions = built.config.dimensions,
            "built vector index"
        );

        Ok(Self {
            ids: indexed_ids,
            built_at: Utc::now(),
            ..built
        })
    }

    /// Number of vectors in the index.
    pub fn len(&self) -> usize {
        self.index.size()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimensions.
    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// When this index was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Search for the `k` nearest vectors, descending by similarity.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(i64, f32)>, VectorIndexError> {
        if self.is_empty() || k == 0 {
            return Ok(vec![]);
        }
        if query.len() != self.config.dimensions {
            return Err(VectorIndexError::InvalidDimensions(
                self.config.dimensions,
                query.len(),
            ));
        }

        let matches = self
            .index
            .search(query, k)
            .map_err(|e| VectorIndexError::IndexSearch(e.to_string()))?;

        let results = matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            // Cosine distance → similarity
            .map(|(&key, &distance)| (key as i64, 1.0 - distance))
            .collect();

        Ok(results)
    }

    /// Persist the index blob plus its sidecar into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), VectorIndexError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| VectorIndexError::IndexPersistence(e.to_string()))?;

        let blob_path = dir.join(INDEX_FILE);
        let blob_str = blob_path
            .to_str()
            .ok_or_else(|| VectorIndexError::IndexPersistence("Invalid path".to_string()))?;
        self.index
            .save(blob_str)
            .map_err(|e| VectorIndexError::IndexPersistence(e.to_string()))?;

        let sidecar = IndexSidecar {
            document_ids: self.ids.clone(),
            embedding_dimension: self.config.dimensions,
            count: self.ids.len(),
            built_at: self.built_at,
        };
        let sidecar_json = serde_json::to_string(&sidecar)
            .map_err(|e| VectorIndexError::IndexPersistence(e.to_string()))?;
        std::fs::write(dir.join(SIDECAR_FILE), sidecar_json)
            .map_err(|e| VectorIndexError::IndexPersistence(e.to_string()))?;

        tracing::info!(path = %dir.display(), vectors = self.ids.len(), "saved vector index snapshot");
        Ok(())
    }

    /// Load a persisted index from `dir`.
    ///
    /// Returns `None` — "no usable snapshot" — when files are missing or
    /// corrupt, or when the sidecar dimension disagrees with `expected_dim`.
    /// Callers fall back to a full rebuild; nothing here is a hard error.
    pub fn load(dir: &Path, expected_dim: usize) -> Option<Self> {
        let sidecar_str = match std::fs::read_to_string(dir.join(SIDECAR_FILE)) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(path = %dir.display(), "no vector index sidecar: {}", e);
                return None;
            }
        };
        let sidecar: IndexSidecar = match serde_json::from_str(&sidecar_str) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %dir.display(), "corrupt vector index sidecar: {}", e);
                return None;
            }
        };

        if sidecar.embedding_dimension != expected_dim {
            tracing::warn!(
                snapshot_dim = sidecar.embedding_dimension,
                expected_dim,
                "vector index snapshot dimension mismatch, ignoring snapshot"
            );
            return None;
        }

        let config = VectorIndexConfig::with_dimensions(sidecar.embedding_dimension);
        let index = match Index::new(&config.index_options()) {
            Ok(i) => i,
            Err(e) => {
                tracing::warn!("failed to create index for snapshot load: {}", e);
                return None;
            }
        };

        let blob_path = dir.join(INDEX_FILE);
        let blob_str = blob_path.to_str()?;
        if let Err(e) = index.load(blob_str) {
            tracing::warn!(path = %dir.display(), "failed to load vector index blob: {}", e);
            return None;
        }

        if index.size() != sidecar.count {
            tracing::warn!(
                blob_count = index.size(),
                sidecar_count = sidecar.count,
                "vector index blob and sidecar disagree, ignoring snapshot"
            );
            return None;
        }

        tracing::info!(
            path = %dir.display(),
            vectors = sidecar.count,
            "loaded vector index snapshot"
        );

        Some(Self {
            index,
            config,
            ids: sidecar.document_ids,
            built_at: sidecar.built_at,
        })
    }

    /// Index statistics
    pub fn stats(&self) -> VectorIndexStats {
        VectorIndexStats {
            total_vectors: self.len(),
            dimensions: self.config.dimensions,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
