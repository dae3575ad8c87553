//! Rank Fusion (weighted Reciprocal Rank Fusion)
//!
//! Combines the semantic and keyword rankings into one list. RRF works off
//! rank positions rather than raw scores, which sidesteps the incomparable
//! scales of cosine similarity and BM25:
//!
//! `fused(id) = w * 1/(k + rank_sem + 1) + (1 - w) * 1/(k + rank_kw + 1)`
//!
//! with each term contributing only when the id appears in that list. The
//! weight is a per-call parameter, never engine state, so concurrent
//! searches with different weights cannot interfere.

use std::collections::HashMap;

/// Default RRF dampening constant.
pub const DEFAULT_RRF_K: f32 = 60.0;

/// One fused result with its source ranks echoed for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedHit {
    /// Startup id
    pub id: i64,
    /// Weighted RRF score driving the final ordering
    pub score: f32,
    /// 0-based rank in the semantic list, if present there
    pub semantic_rank: Option<usize>,
    /// 0-based rank in the keyword list, if present there
    pub keyword_rank: Option<usize>,
}

/// Fuse a semantic and a keyword ranking with weighted RRF.
///
/// Both inputs are ordered best-first; raw scores are ignored, only rank
/// positions matter. Ids absent from both lists cannot appear in the output.
///
/// Ties are broken deterministically: better (lower) semantic rank first,
/// with absence from the semantic list ranking worst, then lower id. Sort
/// stability is never relied on.
pub fn reciprocal_rank_fusion(
    semantic: &[(i64, f32)],
    keyword: &[(i64, f32)],
    semantic_weight: f32,
    k: f32,
) -> Vec<FusedHit> {
    let mut fused: HashMap<i64, FusedHit> = HashMap::new();

    for (rank, &(id, _)) in semantic.iter().enumerate() {
        let entry = fused.entry(id).or_insert(FusedHit {
            id,
            score: 0.0,
            semantic_rank: None,
            keyword_rank: None,
        });
        entry.score += semantic_weight / (k + rank as f32 + 1.0);
        entry.semantic_rank.get_or_insert(rank);
    }

    let keyword_weight = 1.0 - semantic_weight;
    for (rank, &(id, _)) in keyword.iter().enumerate() {
        let entry = fused.entry(id).or_insert(FusedHit {
            id,
            score: 0.0,
            semantic_rank: None,
            keyword_rank: None,
        });
        entry.score += keyword_weight / (k + rank as f32 + 1.0);
        entry.keyword_rank.get_or_insert(rank);
    }

    let mut results: Vec<FusedHit> = fused.into_values().collect();
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let a_rank = a.semantic_rank.unwrap_or(usize::MAX);
                let b_rank = b.semantic_rank.unwrap_or(usize::MAX);
                a_rank.cmp(&b_rank)
            })
            .then_with(|| a.id.cmp(&b.id))
    });

    results
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_list_contribution() {
        let semantic = vec![(42, 0.93)];
        let keyword: Vec<(i64, f32)> = vec![];

        let fused = reciprocal_rank_fusion(&semantic, &keyword, 0.6, 60.0);

        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].id, 42);
        assert!((fused[0].score - 0.6 / 61.0).abs() < 1e-6);
        assert_eq!(fused[0].semantic_rank, Some(0));
        assert_eq!(fused[0].keyword_rank, None);
    }

    #[test]
    fn test_both_lists_combine() {
        let semantic = vec![(7, 0.9)];
        let keyword = vec![(7, 12.5)];

        let fused = reciprocal_rank_fusion(&semantic, &keyword, 0.6, 60.0);

        assert_eq!(fused.len(), 1);
        let expected = 0.6 / 61.0 + 0.4 / 61.0;
        assert!((fused[0].score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_appearing_in_both_beats_one_list() {
        let semantic = vec![(1, 0.9), (2, 0.8)];
        let keyword = vec![(2, 5.0), (3, 4.0)];

        let fused = reciprocal_rank_fusion(&semantic, &keyword, 0.5, 60.0);

        assert_eq!(fused[0].id, 2);
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn test_weight_shifts_ranking() {
        // id 1 tops semantic, id 2 tops keyword
        let semantic = vec![(1, 0.9), (2, 0.5)];
        let keyword = vec![(2, 9.0), (1, 1.0)];

        let semantic_heavy = reciprocal_rank_fusion(&semantic, &keyword, 0.9, 60.0);
        assert_eq!(semantic_heavy[0].id, 1);

        let keyword_heavy = reciprocal_rank_fusion(&semantic, &keyword, 0.1, 60.0);
        assert_eq!(keyword_heavy[0].id, 2);
    }

    #[test]
    fn test_tie_break_prefers_semantic_rank_then_id() {
        // With w = 0.5 both ids score 0.5/(k+1): id 10 from semantic only,
        // id 4 from keyword only. Semantic presence must win despite the
        // larger id.
        let semantic = vec![(10, 0.9)];
        let keyword = vec![(4, 3.0)];

        let fused = reciprocal_rank_fusion(&semantic, &keyword, 0.5, 60.0);

        assert_eq!(fused[0].id, 10);
        assert_eq!(fused[1].id, 4);
    }

    #[test]
    fn test_tie_break_on_mirrored_ranks() {
        // Mirrored positions with w = 0.5 produce exactly equal scores;
        // the better semantic rank must order them, not sort accident.
        let semantic = vec![(5, 0.9), (2, 0.8)];
        let keyword = vec![(2, 7.0), (5, 6.0)];

        let fused = reciprocal_rank_fusion(&semantic, &keyword, 0.5, 60.0);

        assert!((fused[0].score - fused[1].score).abs() < 1e-6);
        assert_eq!(fused[0].id, 5);
        assert_eq!(fused[1].id, 2);
    }

    #[test]
    fn test_empty_inputs() {
        let fused = reciprocal_rank_fusion(&[], &[], 0.6, 60.0);
        assert!(fused.is_empty());
    }

    #[test]
    fn test_descending_order() {
        let semantic = vec![(1, 0.9), (2, 0.8), (3, 0.7)];
        let keyword = vec![(3, 5.0), (4, 4.0)];

        let fused = reciprocal_rank_fusion(&semantic, &keyword, 0.6, 60.0);
        for pair in fused.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
