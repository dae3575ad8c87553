//! Keyword Index (BM25)
//!
//! Inverted index over startup text with BM25 scoring. Each startup is
//! flattened into one blob (name, descriptions, vertical, location,
//! technologies, keyword tags) at build time; queries go through the same
//! tokenizer. Like the vector index, an instance is built wholesale and
//! replaced via the engine's snapshot swap, never mutated in place.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use serde::Serialize;

use crate::store::Startup;

// ============================================================================
// BM25 PARAMETERS
// ============================================================================

/// Term-frequency saturation
const K1: f32 = 1.5;

/// Document-length normalization strength
const B: f32 = 0.75;

/// Tokens this short carry no signal
const MIN_TOKEN_LEN: usize = 2;

/// Stopwords dropped during tokenization
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "need", "dare", "ought", "used", "to", "of", "in", "for", "on", "with", "at", "by",
    "from", "as", "into", "through", "during", "before", "after", "above", "below", "between",
    "under", "again", "further", "then", "once", "and", "but", "or", "nor", "so", "yet", "both",
    "either", "neither", "not", "only", "own", "same", "than", "too", "very", "just", "also",
    "now", "here", "there", "when", "where", "why", "how", "all", "each", "every", "few", "more",
    "most", "other", "some", "such", "no", "any", "its", "it", "this", "that", "these", "those",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Tokenize text: lowercase, keep runs of alphanumerics, drop short tokens
/// and stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !stopword_set().contains(t))
        .map(str::to_string)
        .collect()
}

/// Flatten a startup into the text blob the keyword index sees.
fn document_text(startup: &Startup) -> String {
    let mut parts: Vec<&str> = vec![
        &startup.name,
        &startup.short_description,
        &startup.long_description,
    ];
    if let Some(vertical) = &startup.primary_vertical {
        parts.push(vertical);
    }
    parts.push(&startup.headquarters_location);
    parts.extend(startup.technologies.iter().map(String::as_str));
    parts.extend(startup.keywords.iter().map(String::as_str));

    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

// ============================================================================
// KEYWORD INDEX
// ============================================================================

/// Keyword index statistics
#[derive(Debug, Clone, Serialize)]
pub struct KeywordIndexStats {
    /// Number of indexed documents
    pub document_count: usize,
}

/// BM25 inverted index keyed by startup id.
#[derive(Debug, Default)]
pub struct KeywordIndex {
    /// term -> (startup id -> term frequency)
    postings: HashMap<String, HashMap<i64, f32>>,
    /// startup id -> token count
    doc_lengths: HashMap<i64, f32>,
    avg_doc_length: f32,
}

impl KeywordIndex {
    /// An index with nothing in it. Searches return no candidates.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index from a startup snapshot. Startups whose blob
    /// tokenizes to nothing are left out.
    pub fn build(startups: &[Startup]) -> Self {
        let mut index = Self::default();

        for startup in startups {
            let tokens = tokenize(&document_text(startup));
            if tokens.is_empty() {
                continue;
            }

            index.doc_lengths.insert(startup.id, tokens.len() as f32);

            let mut term_freq: HashMap<&str, f32> = HashMap::new();
            for token in &tokens {
                *term_freq.entry(token).or_insert(0.0) += 1.0;
            }
            for (term, freq) in term_freq {
                index
                    .postings
                    .entry(term.to_string())
                    .or_default()
                    .insert(startup.id, freq);
            }
        }

        let count = index.doc_lengths.len();
        if count > 0 {
            index.avg_doc_length = index.doc_lengths.values().sum::<f32>() / count as f32;
        }

        tracing::info!(documents = count, "built keyword index");
        index
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// Search for the top `k` documents matching `query`, descending by
    /// BM25 score. Only documents with score > 0 appear.
    ///
    /// Uses the non-negative IDF variant
    /// `ln((N - df + 0.5) / (df + 0.5) + 1)` so a term present in most
    /// documents cannot push a score below zero.
    pub fn search(&self, query: &str, k: usize) -> Vec<(i64, f32)> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }

        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let n = self.len() as f32;
        let mut scores: HashMap<i64, f32> = HashMap::new();

        for term in &query_tokens {
            let Some(doc_freqs) = self.postings.get(term.as_str()) else {
                continue;
            };
            let df = doc_freqs.len() as f32;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for (&id, &tf) in doc_freqs {
                let dl = self.doc_lengths.get(&id).copied().unwrap_or(0.0);
                let norm = K1 * (1.0 - B + B * dl / self.avg_doc_length);
                *scores.entry(id).or_insert(0.0) += idf * (tf * (K1 + 1.0)) / (tf + norm);
            }
        }

        let mut results: Vec<(i64, f32)> =
            scores.into_iter().filter(|&(_, score)| score > 0.0).collect();
        // Descending score, ascending id on ties so output is deterministic
        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        results.truncate(k);
        results
    }

    /// Index statistics
    pub fn stats(&self) -> KeywordIndexStats {
        KeywordIndexStats {
            document_count: self.len(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
