//! Search Pipeline
//!
//! Rank fusion, vertical diversification, and the composing engine.

pub mod diversify;
pub mod engine;
pub mod fusion;

pub use diversify::{Diversifier, DEFAULT_MAX_PER_VERTICAL};
pub use engine::{
    EngineError, EngineStats, ScoredStartup, SearchEngine, SearchOptions, SearchResponse,
};
pub use fusion::{reciprocal_rank_fusion, FusedHit, DEFAULT_RRF_K};
