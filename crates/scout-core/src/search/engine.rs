//! Hybrid Search Engine
//!
//! The composing orchestrator. Owns both indices behind one atomically
//! swapped snapshot, the query processor, and the diversifier; executes the
//! full pipeline: clean, extract and merge filters, expand, embed, dual
//! retrieve, fuse, hydrate and filter, diversify, truncate.
//!
//! Concurrency contract:
//! - all methods take `&self`; the engine is `Send + Sync` and is shared
//!   via `Arc` without an outer mutex
//! - readers clone an `Arc<IndexSnapshot>` out of the `RwLock`, so a search
//!   never observes a half-swapped index pair
//! - at most one rebuild runs at a time; rebuilds proceed concurrently with
//!   searches against the prior snapshot
//! - first-use initialization runs exactly once on success; a failed
//!   attempt leaves the engine not-ready so the next call may retry
//! - query-specific values (fusion weight, filters) live on the call stack,
//!   never in engine state

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::index::{
    KeywordIndex, KeywordIndexStats, VectorIndex, VectorIndexConfig, VectorIndexError,
    VectorIndexStats,
};
use crate::query::{QueryProcessor, SearchFilters};
use crate::search::diversify::Diversifier;
use crate::search::fusion::reciprocal_rank_fusion;
use crate::store::{RecordStore, Startup};
use crate::taxonomy::Taxonomy;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error types
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The embedding provider failed; fatal to the current call
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The vector index failed
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    /// Initialization failed
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// Per-call search options.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Result count; `None` uses the configured default
    pub top_k: Option<usize>,
    /// Explicit filters; any non-absent field overrides the filter
    /// extracted from query text
    pub filters: SearchFilters,
    /// Round-robin the page across verticals
    pub enable_diversity: bool,
    /// Expand the query with taxonomy synonyms before retrieval
    pub enable_expansion: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: None,
            filters: SearchFilters::default(),
            enable_diversity: true,
            enable_expansion: true,
        }
    }
}

/// One hydrated result.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredStartup {
    /// The full record, resolved from the store at query time
    pub startup: Startup,
    /// Fused RRF score
    pub score: f32,
}

/// The ranked result set with echoed metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// The raw query as received
    pub query: String,
    /// The expanded search text, present only when expansion was enabled
    pub expanded_query: Option<String>,
    pub total_results: usize,
    pub hits: Vec<ScoredStartup>,
    /// The filter set actually applied (explicit merged over implicit)
    pub filters_applied: SearchFilters,
    pub processing_time_ms: f64,
}

/// Engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// Whether first-use initialization has completed
    pub ready: bool,
    pub vector: VectorIndexStats,
    pub keyword: KeywordIndexStats,
    /// The configured default fusion weight (per-call phrasing may override)
    pub default_semantic_weight: f32,
    /// When the current snapshot was built
    pub snapshot_built_at: DateTime<Utc>,
}

// ============================================================================
// INDEX SNAPSHOT
// ============================================================================

/// Both indices built from one record-store snapshot. Published as a unit;
/// a search holds one `Arc` for its whole pipeline and can never pair an
/// old vector index with a new keyword index.
struct IndexSnapshot {
    vector: VectorIndex,
    keyword: KeywordIndex,
    built_at: DateTime<Utc>,
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

/// Hybrid search engine over a startup record store.
///
/// Construct once at process startup and share via `Arc`. Indices build
/// lazily on first search (or eagerly via [`SearchEngine::initialize`]).
pub struct SearchEngine {
    store: Arc<dyn RecordStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    query_processor: QueryProcessor,
    diversifier: Diversifier,
    config: EngineConfig,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    ready: AtomicBool,
    /// Serializes initialization and rebuilds; never held during a search
    rebuild_lock: Mutex<()>,
    /// Query-embedding cache so repeated queries skip the model
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl SearchEngine {
    /// Create an engine. No index work happens here; the first search (or
    /// an explicit [`SearchEngine::initialize`]) builds or loads the
    /// snapshot.
    pub fn new(
        store: Arc<dyn RecordStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        taxonomy: Taxonomy,
        config: EngineConfig,
    ) -> Result<Self> {
        let empty = IndexSnapshot {
            vector: VectorIndex::empty(VectorIndexConfig::with_dimensions(embedder.dimensions()))?,
            keyword: KeywordIndex::empty(),
            built_at: Utc::now(),
        };

        let query_processor = QueryProcessor::new(taxonomy).with_weights(
            config.semantic_weight,
            config.conceptual_weight,
            config.specific_weight,
        );

        let cache_size = NonZeroUsize::new(config.query_cache_size.max(1))
            .unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            store,
            embedder,
            query_processor,
            diversifier: Diversifier::new(config.max_per_vertical),
            config,
            snapshot: RwLock::new(Arc::new(empty)),
            ready: AtomicBool::new(false),
            rebuild_lock: Mutex::new(()),
            query_cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    /// Whether first-use initialization has completed.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Load the persisted snapshot or rebuild from the store. Runs at most
    /// once on success; concurrent callers join the in-flight attempt.
    pub fn initialize(&self) -> Result<()> {
        self.ensure_ready()
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let _guard = self
            .rebuild_lock
            .lock()
            .map_err(|_| EngineError::Init("Rebuild lock poisoned".to_string()))?;

        // Another caller may have finished initialization while this one
        // waited on the lock.
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        self.initialize_inner()?;
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Holding the rebuild lock: load the vector snapshot if one is usable,
    /// otherwise do a full rebuild. The keyword index is always rebuilt
    /// from the store; only embeddings are worth persisting.
    fn initialize_inner(&self) -> Result<()> {
        if let Some(dir) = &self.config.snapshot_dir {
            if let Some(vector) = VectorIndex::load(dir, self.embedder.dimensions()) {
                let keyword = KeywordIndex::build(&self.store.get_all());
                let built_at = vector.built_at();
                self.publish(IndexSnapshot {
                    vector,
                    keyword,
                    built_at,
                })?;
                tracing::info!("search engine initialized from persisted snapshot");
                return Ok(());
            }
        }

        tracing::info!("no usable snapshot, running full rebuild");
        self.rebuild_inner()
    }

    /// Rebuild both indices from a fresh store snapshot and publish them
    /// atomically. Searches in flight keep the prior snapshot.
    pub fn rebuild(&self) -> Result<()> {
        let _guard = self
            .rebuild_lock
            .lock()
            .map_err(|_| EngineError::Init("Rebuild lock poisoned".to_string()))?;

        self.rebuild_inner()?;
        // A manual rebuild satisfies first-use initialization
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Holding the rebuild lock: embed, build, publish, persist.
    fn rebuild_inner(&self) -> Result<()> {
        let started = Instant::now();
        let startups = self.store.get_all();
        tracing::info!(count = startups.len(), "rebuilding search indices");

        let ids: Vec<i64> = startups.iter().map(|s| s.id).collect();
        let texts: Vec<String> = startups.iter().map(embedding_text).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&texts)?
        };

        let vector = VectorIndex::build(
            VectorIndexConfig::with_dimensions(self.embedder.dimensions()),
            &vectors,
            &ids,
        )?;
        let keyword = KeywordIndex::build(&startups);

        // Persisting is best-effort; a failed save must not fail the rebuild
        if let Some(dir) = &self.config.snapshot_dir {
            if let Err(e) = vector.save(dir) {
                tracing::warn!("failed to persist vector index snapshot: {}", e);
            }
        }

        self.publish(IndexSnapshot {
            vector,
            keyword,
            built_at: Utc::now(),
        })?;

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index rebuild complete"
        );
        Ok(())
    }

    fn publish(&self, snapshot: IndexSnapshot) -> Result<()> {
        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| EngineError::Init("Snapshot lock poisoned".to_string()))?;
        *guard = Arc::new(snapshot);
        Ok(())
    }

    fn current_snapshot(&self) -> Result<Arc<IndexSnapshot>> {
        self.snapshot
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| EngineError::Init("Snapshot lock poisoned".to_string()))
    }

    /// Embed `text`, going through the LRU cache. The cache is keyed by the
    /// exact search text (post-expansion), so hits are genuine repeats.
    fn query_embedding(&self, text: &str) -> Result<Vec<f32>> {
        if let Ok(mut cache) = self.query_cache.lock() {
            if let Some(vector) = cache.get(text) {
                return Ok(vector.clone());
            }
        }

        let vector = self.embedder.embed(text)?;

        if let Ok(mut cache) = self.query_cache.lock() {
            cache.put(text.to_string(), vector.clone());
        }
        Ok(vector)
    }

    /// Execute the full search pipeline.
    ///
    /// Embedding happens exactly once per call. The fusion weight is chosen
    /// from the cleaned query and threaded through as a parameter, so
    /// concurrent calls with different weights stay independent.
    pub fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResponse> {
        let started = Instant::now();
        self.ensure_ready()?;

        let top_k = options.top_k.unwrap_or(self.config.default_top_k);

        let clean = self.query_processor.clean(query);
        let implicit = SearchFilters::from_extracted(&self.query_processor.extract_filters(query));
        let filters = options.filters.merged_over(implicit);

        let (search_text, expanded_query) = if options.enable_expansion {
            let expanded = self.query_processor.expand(&clean);
            (expanded.clone(), Some(expanded))
        } else {
            (clean.clone(), None)
        };

        let semantic_weight = self.query_processor.weight(&clean);
        let fetch_k = (top_k * self.config.fetch_multiplier).min(self.config.max_fetch);

        let snapshot = self.current_snapshot()?;

        // An all-punctuation query cleans to nothing; skip the provider
        // rather than surfacing its empty-input error
        let semantic = if search_text.trim().is_empty() {
            Vec::new()
        } else {
            let query_vector = self.query_embedding(&search_text)?;
            snapshot.vector.search(&query_vector, fetch_k)?
        };
        let keyword = snapshot.keyword.search(&search_text, fetch_k);

        let fused = reciprocal_rank_fusion(&semantic, &keyword, semantic_weight, self.config.rrf_k);

        // Hydrate against the live store; filters apply after fusion so the
        // rank positions feeding RRF stay unfiltered
        let mut hits: Vec<ScoredStartup> = Vec::new();
        for fused_hit in &fused {
            let Some(startup) = self.store.get_by_id(fused_hit.id) else {
                tracing::debug!(id = fused_hit.id, "skipping stale index hit");
                continue;
            };
            if !filters.matches(&startup) {
                continue;
            }
            hits.push(ScoredStartup {
                startup,
                score: fused_hit.score,
            });
        }

        let hits = if options.enable_diversity {
            self.diversifier.diversify(hits, top_k)
        } else {
            hits.truncate(top_k);
            hits
        };

        Ok(SearchResponse {
            query: query.to_string(),
            expanded_query,
            total_results: hits.len(),
            hits,
            filters_applied: filters,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// Engine statistics for the stats endpoint.
    pub fn get_stats(&self) -> Result<EngineStats> {
        let snapshot = self.current_snapshot()?;
        Ok(EngineStats {
            ready: self.is_ready(),
            vector: snapshot.vector.stats(),
            keyword: snapshot.keyword.stats(),
            default_semantic_weight: self.config.semantic_weight,
            snapshot_built_at: snapshot.built_at,
        })
    }
}

/// The text blob embedded per startup: name, both descriptions, and
/// technologies. Keyword-only fields (location, tags) stay out; they add
/// noise to the semantic representation.
fn embedding_text(startup: &Startup) -> String {
    let mut parts: Vec<&str> = vec![&startup.name];
    if !startup.short_description.is_empty() {
        parts.push(&startup.short_description);
    }
    if !startup.long_description.is_empty() {
        parts.push(&startup.long_description);
    }
    parts.extend(startup.technologies.iter().map(String::as_str));
    parts.join(" ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_text_skips_empty_fields() {
        let mut s = Startup::new(1, "Helio");
        s.technologies = vec!["perovskite".to_string()];
        assert_eq!(embedding_text(&s), "Helio perovskite");
    }

    #[test]
    fn test_search_options_default() {
        let options = SearchOptions::default();
        assert!(options.enable_diversity);
        assert!(options.enable_expansion);
        assert!(options.top_k.is_none());
        assert!(options.filters.is_empty());
    }
}
