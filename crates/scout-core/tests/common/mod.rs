//! Shared fixtures for integration tests: a deterministic embedder that
//! needs no model download, plus a small startup corpus and taxonomy.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use scout_core::{
    l2_normalize, EmbeddingError, EmbeddingProvider, Startup, SynonymGroup, Taxonomy, Vertical,
};

/// Bag-of-words hash embedder. Each lowercased word hashes to one bucket;
/// texts sharing words get high cosine similarity, which is all the engine
/// pipeline needs for end-to-end assertions.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dims
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dims];
        for word in text.to_lowercase().split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dims;
            vector[bucket] += 1.0;
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

fn startup(
    id: i64,
    name: &str,
    short: &str,
    vertical: Option<&str>,
    founded: Option<i32>,
    funding: Option<f64>,
) -> Startup {
    let mut s = Startup::new(id, name);
    s.short_description = short.to_string();
    s.primary_vertical = vertical.map(str::to_string);
    s.founded_year = founded;
    s.total_funding_usd = funding;
    s
}

/// Eight startups across three verticals, with gaps in the optional fields
/// so filter exclusion paths get exercised.
pub fn fixture_startups() -> Vec<Startup> {
    vec![
        startup(
            1,
            "Heliogen",
            "concentrated solar power plants",
            Some("clean_energy"),
            Some(2018),
            Some(50_000_000.0),
        ),
        startup(
            2,
            "SunWave",
            "rooftop solar panels for homes",
            Some("clean_energy"),
            Some(2021),
            Some(10_000_000.0),
        ),
        startup(
            3,
            "WindFlow",
            "offshore wind turbines",
            Some("clean_energy"),
            Some(2019),
            Some(30_000_000.0),
        ),
        startup(
            4,
            "PayZip",
            "instant payments infrastructure",
            Some("fintech"),
            Some(2020),
            Some(100_000_000.0),
        ),
        startup(
            5,
            "LendLoop",
            "small business banking and loans",
            Some("fintech"),
            Some(2016),
            Some(5_000_000.0),
        ),
        startup(
            6,
            "VoltCar",
            "electric vehicle charging network",
            Some("mobility"),
            Some(2022),
            None,
        ),
        startup(
            7,
            "SolarStealth",
            "stealth solar startup",
            Some("clean_energy"),
            None,
            None,
        ),
        startup(8, "Orphan Labs", "uncategorized research lab", None, Some(2015), None),
    ]
}

pub fn fixture_taxonomy() -> Taxonomy {
    Taxonomy {
        verticals: vec![
            Vertical {
                id: "clean_energy".to_string(),
                name: "Clean Energy".to_string(),
                keywords: vec![
                    "solar".to_string(),
                    "wind".to_string(),
                    "renewable".to_string(),
                ],
                description: String::new(),
            },
            Vertical {
                id: "fintech".to_string(),
                name: "Fintech".to_string(),
                keywords: vec!["payments".to_string(), "banking".to_string()],
                description: String::new(),
            },
            Vertical {
                id: "mobility".to_string(),
                name: "Mobility".to_string(),
                keywords: vec!["electric vehicle".to_string(), "transport".to_string()],
                description: String::new(),
            },
        ],
        synonyms: vec![SynonymGroup {
            canonical: "ev".to_string(),
            synonyms: vec![
                "electric vehicle".to_string(),
                "electric car".to_string(),
            ],
        }],
    }
}
