//! Result Diversification
//!
//! Reorders a fused-score-ordered hit list so no single vertical dominates
//! the page. Round-robin across verticals (uncategorized startups form
//! their own bucket at equal priority), each bucket capped, then backfill
//! from the original order if the rounds stall before `total`.

use std::collections::HashSet;

use crate::search::engine::ScoredStartup;

/// Default cap on results from one vertical
pub const DEFAULT_MAX_PER_VERTICAL: usize = 3;

/// Round-robins hits across verticals to bound per-vertical concentration.
#[derive(Debug, Clone)]
pub struct Diversifier {
    max_per_vertical: usize,
}

impl Default for Diversifier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_VERTICAL)
    }
}

impl Diversifier {
    /// Create a diversifier with the given per-vertical cap.
    pub fn new(max_per_vertical: usize) -> Self {
        Self { max_per_vertical }
    }

    /// The configured per-vertical cap.
    pub fn max_per_vertical(&self) -> usize {
        self.max_per_vertical
    }

    /// Reorder `hits` (already fused-score ordered) and truncate to `total`.
    ///
    /// Buckets keep their internal fused order and are visited in
    /// first-seen order each round. Backfill draws from the original order,
    /// skipping already-emitted ids, and is the only path that can push a
    /// vertical past the cap - and only once every bucket is capped or
    /// exhausted.
    pub fn diversify(&self, hits: Vec<ScoredStartup>, total: usize) -> Vec<ScoredStartup> {
        if hits.len() <= 1 || total == 0 {
            let mut hits = hits;
            hits.truncate(total);
            return hits;
        }

        // Bucket indices by vertical, first-seen order
        let mut bucket_keys: Vec<Option<&str>> = Vec::new();
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        for (i, hit) in hits.iter().enumerate() {
            let key = hit.startup.primary_vertical.as_deref();
            match bucket_keys.iter().position(|k| *k == key) {
                Some(b) => buckets[b].push(i),
                None => {
                    bucket_keys.push(key);
                    buckets.push(vec![i]);
                }
            }
        }

        let mut picked: Vec<usize> = Vec::with_capacity(total.min(hits.len()));
        let mut cursors = vec![0usize; buckets.len()];

        // Round-robin rounds until nothing can be contributed
        'rounds: loop {
            let mut emitted_this_round = false;
            for (b, bucket) in buckets.iter().enumerate() {
                if cursors[b] >= self.max_per_vertical || cursors[b] >= bucket.len() {
                    continue;
                }
                picked.push(bucket[cursors[b]]);
                cursors[b] += 1;
                emitted_this_round = true;
                if picked.len() >= total {
                    break 'rounds;
                }
            }
            if !emitted_this_round {
                break;
            }
        }

        // Backfill from fused order once no bucket can contribute
        if picked.len() < total {
            let used: HashSet<usize> = picked.iter().copied().collect();
            for i in 0..hits.len() {
                if picked.len() >= total {
                    break;
                }
                if !used.contains(&i) {
                    picked.push(i);
                }
            }
        }

        // Pull the picked hits out in selection order
        let mut slots: Vec<Option<ScoredStartup>> = hits.into_iter().map(Some).collect();
        picked
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Startup;

    fn hit(id: i64, vertical: Option<&str>, score: f32) -> ScoredStartup {
        let mut startup = Startup::new(id, format!("s{id}"));
        startup.primary_vertical = vertical.map(str::to_string);
        ScoredStartup { startup, score }
    }

    fn verticals_of(hits: &[ScoredStartup]) -> Vec<Option<String>> {
        hits.iter()
            .map(|h| h.startup.primary_vertical.clone())
            .collect()
    }

    #[test]
    fn test_two_verticals_capped_evenly() {
        // 10 of A then 10 of B in fused order; cap 3, total 6 => 3 + 3
        let mut hits = Vec::new();
        for i in 0..10 {
            hits.push(hit(i, Some("a"), 1.0 - i as f32 * 0.01));
        }
        for i in 10..20 {
            hits.push(hit(i, Some("b"), 0.5 - (i - 10) as f32 * 0.01));
        }

        let out = Diversifier::new(3).diversify(hits, 6);

        assert_eq!(out.len(), 6);
        let a_count = out
            .iter()
            .filter(|h| h.startup.primary_vertical.as_deref() == Some("a"))
            .count();
        assert_eq!(a_count, 3);
    }

    #[test]
    fn test_round_robin_interleaves() {
        let hits = vec![
            hit(1, Some("a"), 0.9),
            hit(2, Some("a"), 0.8),
            hit(3, Some("b"), 0.7),
            hit(4, Some("b"), 0.6),
        ];

        let out = Diversifier::new(3).diversify(hits, 4);
        let verticals = verticals_of(&out);
        assert_eq!(
            verticals,
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("a".to_string()),
                Some("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_uncategorized_is_its_own_bucket() {
        let hits = vec![
            hit(1, Some("a"), 0.9),
            hit(2, None, 0.8),
            hit(3, Some("a"), 0.7),
            hit(4, None, 0.6),
        ];

        let out = Diversifier::new(3).diversify(hits, 4);
        let verticals = verticals_of(&out);
        assert_eq!(
            verticals,
            vec![Some("a".to_string()), None, Some("a".to_string()), None]
        );
    }

    #[test]
    fn test_backfill_when_buckets_capped() {
        // One vertical, cap 2, total 4: rounds emit 2, backfill completes
        // from the original order.
        let hits = vec![
            hit(1, Some("a"), 0.9),
            hit(2, Some("a"), 0.8),
            hit(3, Some("a"), 0.7),
            hit(4, Some("a"), 0.6),
            hit(5, Some("a"), 0.5),
        ];

        let out = Diversifier::new(2).diversify(hits, 4);
        let ids: Vec<i64> = out.iter().map(|h| h.startup.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_cap_holds_without_backfill_pressure() {
        // Plenty of other buckets: no vertical exceeds the cap
        let mut hits = Vec::new();
        for i in 0..6 {
            hits.push(hit(i, Some("a"), 1.0));
        }
        for i in 6..12 {
            hits.push(hit(i, Some("b"), 0.9));
        }
        for i in 12..18 {
            hits.push(hit(i, Some("c"), 0.8));
        }

        let out = Diversifier::new(2).diversify(hits, 6);
        for key in ["a", "b", "c"] {
            let count = out
                .iter()
                .filter(|h| h.startup.primary_vertical.as_deref() == Some(key))
                .count();
            assert_eq!(count, 2);
        }
    }

    #[test]
    fn test_short_input_passthrough() {
        let hits = vec![hit(1, Some("a"), 0.9)];
        let out = Diversifier::new(3).diversify(hits, 10);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_total_zero() {
        let hits = vec![hit(1, Some("a"), 0.9), hit(2, Some("b"), 0.8)];
        assert!(Diversifier::new(3).diversify(hits, 0).is_empty());
    }

    #[test]
    fn test_never_exceeds_total() {
        let hits: Vec<ScoredStartup> = (0..30)
            .map(|i| hit(i, Some(if i % 2 == 0 { "a" } else { "b" }), 1.0))
            .collect();
        let out = Diversifier::new(5).diversify(hits, 7);
        assert_eq!(out.len(), 7);
    }
}
