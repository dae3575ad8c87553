//! Index Module
//!
//! The two retrieval indices the engine fuses:
//! - Vector index: HNSW over unit-normalized embeddings (USearch)
//! - Keyword index: BM25 inverted index
//!
//! Both are built wholesale from a record-store snapshot and published
//! together via the engine's atomic snapshot swap.

mod keyword;
mod vector;

pub use keyword::{tokenize, KeywordIndex, KeywordIndexStats};
pub use vector::{
    VectorIndex, VectorIndexConfig, VectorIndexError, VectorIndexStats, DEFAULT_CONNECTIVITY,
    DEFAULT_EXPANSION_ADD, DEFAULT_EXPANSION_SEARCH,
};
