//! # Scout Core
//!
//! Hybrid retrieval engine for startup discovery. Fuses two retrieval
//! channels over the same record set:
//!
//! - **Semantic**: HNSW vector search (USearch) over locally generated
//!   embeddings (fastembed, nomic-embed-text-v1.5)
//! - **Keyword**: in-memory BM25 inverted index
//!
//! Channel rankings are combined with weighted Reciprocal Rank Fusion,
//! where the semantic weight adapts to query phrasing (conceptual queries
//! lean semantic, exact-name queries lean keyword). Before retrieval,
//! queries pass through a lightweight processor that extracts structured
//! filters (founding year, funding, vertical) from natural language and
//! expands terms with taxonomy synonyms. Result pages can be round-robin
//! diversified across verticals.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scout_core::{
//!     EngineConfig, InMemoryRecordStore, LocalEmbedder, SearchEngine, SearchOptions, Taxonomy,
//! };
//!
//! let store = Arc::new(InMemoryRecordStore::new(startups));
//! let embedder = Arc::new(LocalEmbedder::new());
//! let engine = SearchEngine::new(store, embedder, Taxonomy::default(), EngineConfig::default())?;
//!
//! // Indices build lazily on the first call
//! let response = engine.search("AI startups founded after 2020", SearchOptions::default())?;
//! for hit in &response.hits {
//!     println!("{} ({:.4})", hit.startup.name, hit.score);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `embeddings` (default): local embedding generation with fastembed.
//!   Without it, supply your own [`EmbeddingProvider`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod embedding;
pub mod index;
pub mod query;
pub mod search;
pub mod store;
pub mod taxonomy;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Configuration
pub use config::EngineConfig;

// Record store
pub use store::{InMemoryRecordStore, RecordStore, Startup};

// Taxonomy
pub use taxonomy::{SynonymGroup, Taxonomy, Vertical};

// Embedding abstraction
pub use embedding::{cosine_similarity, l2_normalize, EmbeddingError, EmbeddingProvider};

#[cfg(feature = "embeddings")]
#[cfg_attr(docsrs, doc(cfg(feature = "embeddings")))]
pub use embedding::{LocalEmbedder, EMBEDDING_DIMENSIONS};

// Indices
pub use index::{
    tokenize, KeywordIndex, KeywordIndexStats, VectorIndex, VectorIndexConfig, VectorIndexError,
    VectorIndexStats,
};

// Query processing
pub use query::{ExtractedFilter, QueryProcessor, SearchFilters};

// Search pipeline
pub use search::{
    reciprocal_rank_fusion, Diversifier, EngineError, EngineStats, FusedHit, ScoredStartup,
    SearchEngine, SearchOptions, SearchResponse, DEFAULT_RRF_K,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        EngineConfig, EngineError, InMemoryRecordStore, RecordStore, ScoredStartup, SearchEngine,
        SearchFilters, SearchOptions, SearchResponse, Startup, Taxonomy, Vertical,
    };

    #[cfg(feature = "embeddings")]
    pub use crate::LocalEmbedder;

    pub use crate::EmbeddingProvider;
}
