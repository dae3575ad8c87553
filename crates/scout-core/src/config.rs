//! Engine Configuration

use std::path::PathBuf;

use crate::search::fusion::DEFAULT_RRF_K;

/// Configuration for the search engine.
///
/// The defaults are the tuned production values; deployments override
/// individual fields rather than constructing from scratch.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Results returned when the caller does not ask for a specific count
    pub default_top_k: usize,
    /// Semantic weight used when query phrasing is neither conceptual nor
    /// specific
    pub semantic_weight: f32,
    /// Semantic weight for conceptual queries ("similar to", "companies doing")
    pub conceptual_weight: f32,
    /// Semantic weight for exact-lookup queries ("named", "exact")
    pub specific_weight: f32,
    /// RRF dampening constant
    pub rrf_k: f32,
    /// Candidates fetched per index = top_k * fetch_multiplier, capped below
    pub fetch_multiplier: usize,
    /// Hard cap on candidates fetched per index
    pub max_fetch: usize,
    /// Per-vertical cap applied by the diversifier
    pub max_per_vertical: usize,
    /// Directory for the persisted vector index snapshot; `None` disables
    /// persistence and every initialization is a full rebuild
    pub snapshot_dir: Option<PathBuf>,
    /// Entries kept in the query-embedding LRU cache
    pub query_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_top_k: 20,
            semantic_weight: 0.6,
            conceptual_weight: 0.7,
            specific_weight: 0.4,
            rrf_k: DEFAULT_RRF_K,
            fetch_multiplier: 5,
            max_fetch: 200,
            max_per_vertical: 3,
            snapshot_dir: None,
            query_cache_size: 100,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
