//! Query Processing
//!
//! Everything that happens to raw query text before retrieval:
//! - cleaning (whitespace collapse, character stripping)
//! - implicit filter extraction via regex probes (year, funding, vertical)
//! - synonym/keyword expansion for recall
//! - fusion-weight selection from query phrasing
//!
//! The processor is built once from the taxonomy and is read-only
//! thereafter; every method is a pure function of its input.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::store::Startup;
use crate::taxonomy::Taxonomy;

// ============================================================================
// WEIGHT PHRASES
// ============================================================================

/// Phrases signalling a conceptual query, where semantic search carries more
/// weight. Checked before the specific phrases.
const CONCEPTUAL_PHRASES: &[&str] = &[
    "like",
    "similar",
    "related",
    "alternative",
    "comparable",
    "technology for",
    "solutions for",
    "companies doing",
    "startups working on",
    "focused on",
];

/// Phrases signalling an exact-lookup query, where keyword search carries
/// more weight.
const SPECIFIC_PHRASES: &[&str] = &["named", "called", "exact", "specifically"];

// ============================================================================
// FILTERS
// ============================================================================

/// One filter recognized in query text. Extraction probes run independently,
/// so a single query can yield several of these.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedFilter {
    /// Minimum founding year ("founded after 2020")
    FoundedAfter(i32),
    /// Maximum founding year ("before 2015")
    FoundedBefore(i32),
    /// Minimum total funding in USD ("raised over $50 million")
    MinFunding(f64),
    /// Vertical id matched from the taxonomy
    Vertical(String),
}

/// The flat filter set applied to hydrated results after fusion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Exact match on `Startup::primary_vertical`
    pub vertical: Option<String>,
    pub founded_year_min: Option<i32>,
    pub founded_year_max: Option<i32>,
    pub min_funding_usd: Option<f64>,
}

impl SearchFilters {
    /// Flatten extracted filters. The first filter of each kind wins.
    pub fn from_extracted(extracted: &[ExtractedFilter]) -> Self {
        let mut filters = Self::default();
        for filter in extracted {
            match filter {
                ExtractedFilter::FoundedAfter(year) => {
                    filters.founded_year_min.get_or_insert(*year);
                }
                ExtractedFilter::FoundedBefore(year) => {
                    filters.founded_year_max.get_or_insert(*year);
                }
                ExtractedFilter::MinFunding(amount) => {
                    filters.min_funding_usd.get_or_insert(*amount);
                }
                ExtractedFilter::Vertical(id) => {
                    filters.vertical.get_or_insert(id.clone());
                }
            }
        }
        filters
    }

    /// Merge `self` (explicit, caller-supplied) over implicit filters.
    /// Any explicit non-absent field overrides the implicit one.
    pub fn merged_over(self, implicit: SearchFilters) -> Self {
        Self {
            vertical: self.vertical.or(implicit.vertical),
            founded_year_min: self.founded_year_min.or(implicit.founded_year_min),
            founded_year_max: self.founded_year_max.or(implicit.founded_year_max),
            min_funding_usd: self.min_funding_usd.or(implicit.min_funding_usd),
        }
    }

    /// Whether any filter is set.
    pub fn is_empty(&self) -> bool {
        self.vertical.is_none()
            && self.founded_year_min.is_none()
            && self.founded_year_max.is_none()
            && self.min_funding_usd.is_none()
    }

    /// Apply the filter set to one record. A record missing a field is
    /// excluded whenever a bound on that field is set.
    pub fn matches(&self, startup: &Startup) -> bool {
        if let Some(vertical) = &self.vertical {
            if startup.primary_vertical.as_deref() != Some(vertical.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.founded_year_min {
            match startup.founded_year {
                Some(year) if year >= min => {}
                _ => return false,
            }
        }
        if let Some(max) = self.founded_year_max {
            match startup.founded_year {
                Some(year) if year <= max => {}
                _ => return false,
            }
        }
        if let Some(min) = self.min_funding_usd {
            match startup.total_funding_usd {
                Some(funding) if funding >= min => {}
                _ => return false,
            }
        }
        true
    }
}

// ============================================================================
// QUERY PROCESSOR
// ============================================================================

/// Cleans queries, extracts implicit filters, expands with synonyms, and
/// picks the per-call fusion weight.
pub struct QueryProcessor {
    taxonomy: Taxonomy,
    year_min_re: Regex,
    year_max_re: Regex,
    funding_re: Regex,
    default_weight: f32,
    conceptual_weight: f32,
    specific_weight: f32,
}

impl QueryProcessor {
    /// Build a processor over the given taxonomy with default weights.
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy,
            // Patterns run against lowercased text, so no (?i) needed
            year_min_re: Regex::new(r"(?:founded|started|since|after)\s*(?:in\s+)?(\d{4})")
                .expect("static pattern"),
            year_max_re: Regex::new(r"(?:before|until)\s+(\d{4})").expect("static pattern"),
            funding_re: Regex::new(
                r"(?:raised|funding|over)\s*\$?(\d+(?:\.\d+)?)\s*(m|million|b|billion)?",
            )
            .expect("static pattern"),
            default_weight: 0.6,
            conceptual_weight: 0.7,
            specific_weight: 0.4,
        }
    }

    /// Override the fusion weights picked by [`QueryProcessor::weight`].
    pub fn with_weights(mut self, default: f32, conceptual: f32, specific: f32) -> Self {
        self.default_weight = default;
        self.conceptual_weight = conceptual;
        self.specific_weight = specific;
        self
    }

    /// Clean raw query text: collapse whitespace, keep only alphanumerics,
    /// whitespace, and hyphens.
    pub fn clean(&self, raw: &str) -> String {
        let filtered: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
            .collect();
        filtered.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Extract implicit filters from raw query text.
    ///
    /// Probes are independent, so "solar startups founded after 2020" yields
    /// both a vertical and a year filter. A probe that matches nothing
    /// contributes nothing; this never fails.
    pub fn extract_filters(&self, raw: &str) -> Vec<ExtractedFilter> {
        let lower = raw.to_lowercase();
        let mut filters = Vec::new();

        if let Some(caps) = self.year_min_re.captures(&lower) {
            if let Ok(year) = caps[1].parse::<i32>() {
                filters.push(ExtractedFilter::FoundedAfter(year));
            }
        }

        if let Some(caps) = self.year_max_re.captures(&lower) {
            if let Ok(year) = caps[1].parse::<i32>() {
                filters.push(ExtractedFilter::FoundedBefore(year));
            }
        }

        if let Some(caps) = self.funding_re.captures(&lower) {
            if let Ok(amount) = caps[1].parse::<f64>() {
                let scale = match caps.get(2).map(|m| m.as_str()) {
                    Some(unit) if unit.starts_with('b') => 1e9,
                    Some(unit) if unit.starts_with('m') => 1e6,
                    _ => 1.0,
                };
                filters.push(ExtractedFilter::MinFunding(amount * scale));
            }
        }

        // First vertical whose name or any keyword appears wins; later
        // verticals are not consulted.
        'verticals: for vertical in &self.taxonomy.verticals {
            if lower.contains(&vertical.name.to_lowercase()) {
                filters.push(ExtractedFilter::Vertical(vertical.id.clone()));
                break 'verticals;
            }
            for keyword in &vertical.keywords {
                if lower.contains(&keyword.to_lowercase()) {
                    filters.push(ExtractedFilter::Vertical(vertical.id.clone()));
                    break 'verticals;
                }
            }
        }

        filters
    }

    /// Expand a cleaned query with taxonomy synonyms and vertical keywords.
    ///
    /// The original query always comes first; added terms are deduplicated
    /// case-insensitively in first-seen order.
    pub fn expand(&self, clean: &str) -> String {
        let lower = clean.to_lowercase();
        let mut terms: Vec<String> = vec![clean.to_string()];
        let mut seen: Vec<String> = vec![lower.clone()];

        let mut push = |terms: &mut Vec<String>, seen: &mut Vec<String>, term: &str| {
            let key = term.to_lowercase();
            if !seen.contains(&key) {
                seen.push(key);
                terms.push(term.to_string());
            }
        };

        for group in &self.taxonomy.synonyms {
            if lower.contains(&group.canonical.to_lowercase()) {
                for synonym in &group.synonyms {
                    push(&mut terms, &mut seen, synonym);
                }
            }
            if group
                .synonyms
                .iter()
                .any(|s| lower.contains(&s.to_lowercase()))
            {
                push(&mut terms, &mut seen, &group.canonical);
            }
        }

        for vertical in &self.taxonomy.verticals {
            let keyword_hit = vertical
                .keywords
                .iter()
                .any(|k| lower.contains(&k.to_lowercase()));
            if keyword_hit {
                for keyword in vertical.keywords.iter().take(3) {
                    push(&mut terms, &mut seen, keyword);
                }
            }
        }

        terms.join(" ")
    }

    /// Pick the semantic fusion weight for this query.
    ///
    /// Conceptual phrasing leans on semantic search; exact-lookup phrasing
    /// leans on keywords. Conceptual phrases are checked first.
    pub fn weight(&self, clean: &str) -> f32 {
        let lower = clean.to_lowercase();

        if CONCEPTUAL_PHRASES.iter().any(|p| lower.contains(p)) {
            return self.conceptual_weight;
        }
        if SPECIFIC_PHRASES.iter().any(|p| lower.contains(p)) {
            return self.specific_weight;
        }
        self.default_weight
    }

    /// The taxonomy this processor was built over.
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{SynonymGroup, Vertical};

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            verticals: vec![
                Vertical {
                    id: "clean_energy".to_string(),
                    name: "Clean Energy".to_string(),
                    keywords: vec![
                        "solar".to_string(),
                        "wind".to_string(),
                        "renewable".to_string(),
                        "geothermal".to_string(),
                    ],
                    description: String::new(),
                },
                Vertical {
                    id: "carbon_removal".to_string(),
                    name: "Carbon Removal".to_string(),
                    keywords: vec!["carbon capture".to_string(), "dac".to_string()],
                    description: String::new(),
                },
            ],
            synonyms: vec![SynonymGroup {
                canonical: "ev".to_string(),
                synonyms: vec!["electric vehicle".to_string(), "electric car".to_string()],
            }],
        }
    }

    fn processor() -> QueryProcessor {
        QueryProcessor::new(taxonomy())
    }

    #[test]
    fn test_clean_strips_and_collapses() {
        let p = processor();
        assert_eq!(
            p.clean("  solar!  panels?? (cheap)   grid-scale "),
            "solar panels cheap grid-scale"
        );
    }

    #[test]
    fn test_extract_year_min() {
        let p = processor();
        let filters =
            SearchFilters::from_extracted(&p.extract_filters("solar startups founded after 2020"));
        assert_eq!(filters.founded_year_min, Some(2020));
        assert_eq!(filters.vertical.as_deref(), Some("clean_energy"));
    }

    #[test]
    fn test_extract_year_min_with_in() {
        let p = processor();
        let filters = p.extract_filters("companies started in 2018");
        assert!(filters.contains(&ExtractedFilter::FoundedAfter(2018)));
    }

    #[test]
    fn test_extract_year_max() {
        let p = processor();
        let filters = SearchFilters::from_extracted(&p.extract_filters("founded before 2015"));
        assert_eq!(filters.founded_year_max, Some(2015));
    }

    #[test]
    fn test_extract_funding_million() {
        let p = processor();
        let filters = SearchFilters::from_extracted(&p.extract_filters("raised over $50 million"));
        assert_eq!(filters.min_funding_usd, Some(50_000_000.0));
    }

    #[test]
    fn test_extract_funding_billion() {
        let p = processor();
        let filters = SearchFilters::from_extracted(&p.extract_filters("funding over $1.5b"));
        assert_eq!(filters.min_funding_usd, Some(1_500_000_000.0));
    }

    #[test]
    fn test_extract_funding_literal() {
        let p = processor();
        let filters = SearchFilters::from_extracted(&p.extract_filters("raised $900000"));
        assert_eq!(filters.min_funding_usd, Some(900_000.0));
    }

    #[test]
    fn test_extract_vertical_first_match_wins() {
        // Both verticals could match; taxonomy order decides and the check
        // short-circuits.
        let p = processor();
        let filters = p.extract_filters("solar powered carbon capture");
        let verticals: Vec<_> = filters
            .iter()
            .filter(|f| matches!(f, ExtractedFilter::Vertical(_)))
            .collect();
        assert_eq!(
            verticals,
            vec![&ExtractedFilter::Vertical("clean_energy".to_string())]
        );
    }

    #[test]
    fn test_extract_nothing() {
        let p = processor();
        assert!(p.extract_filters("quantum computing chips").is_empty());
    }

    #[test]
    fn test_expand_adds_synonyms_for_canonical() {
        let p = processor();
        let expanded = p.expand("ev charging");
        assert!(expanded.starts_with("ev charging"));
        assert!(expanded.contains("electric vehicle"));
        assert!(expanded.contains("electric car"));
    }

    #[test]
    fn test_expand_adds_canonical_for_synonym() {
        let p = processor();
        let expanded = p.expand("electric car batteries");
        assert!(expanded.contains("ev"));
    }

    #[test]
    fn test_expand_adds_first_three_vertical_keywords() {
        let p = processor();
        let expanded = p.expand("wind farms");
        assert!(expanded.contains("solar"));
        assert!(expanded.contains("renewable"));
        // Only the first three keywords come along
        assert!(!expanded.contains("geothermal"));
    }

    #[test]
    fn test_expand_dedupes_case_insensitively() {
        let p = processor();
        // "Solar" is the whole query; the vertical keyword "solar" must not
        // be appended a second time under different case.
        let expanded = p.expand("Solar");
        let solar_count = expanded.to_lowercase().matches("solar").count();
        assert_eq!(solar_count, 1);
    }

    #[test]
    fn test_weight_conceptual() {
        let p = processor();
        assert_eq!(p.weight("companies doing grid storage"), 0.7);
        assert_eq!(p.weight("startups similar to Helio"), 0.7);
    }

    #[test]
    fn test_weight_specific() {
        let p = processor();
        assert_eq!(p.weight("the startup named Helio"), 0.4);
    }

    #[test]
    fn test_weight_conceptual_checked_first() {
        let p = processor();
        // Matches both lists; conceptual wins
        assert_eq!(p.weight("companies doing exact logistics"), 0.7);
    }

    #[test]
    fn test_weight_default() {
        let p = processor();
        assert_eq!(p.weight("grid storage"), 0.6);
    }

    #[test]
    fn test_merge_explicit_overrides_implicit() {
        let implicit = SearchFilters {
            vertical: Some("clean_energy".to_string()),
            founded_year_min: Some(2018),
            ..Default::default()
        };
        let explicit = SearchFilters {
            vertical: Some("carbon_removal".to_string()),
            ..Default::default()
        };

        let merged = explicit.merged_over(implicit);
        assert_eq!(merged.vertical.as_deref(), Some("carbon_removal"));
        assert_eq!(merged.founded_year_min, Some(2018));
    }

    #[test]
    fn test_filter_matches_missing_fields_excluded() {
        let filters = SearchFilters {
            founded_year_min: Some(2015),
            ..Default::default()
        };
        let mut s = Startup::new(1, "Helio");
        assert!(!filters.matches(&s)); // year unknown, bound set

        s.founded_year = Some(2020);
        assert!(filters.matches(&s));

        s.founded_year = Some(2010);
        assert!(!filters.matches(&s));
    }

    #[test]
    fn test_filter_matches_funding() {
        let filters = SearchFilters {
            min_funding_usd: Some(1_000_000.0),
            ..Default::default()
        };
        let mut s = Startup::new(1, "Helio");
        assert!(!filters.matches(&s));

        s.total_funding_usd = Some(2_500_000.0);
        assert!(filters.matches(&s));
    }
}
