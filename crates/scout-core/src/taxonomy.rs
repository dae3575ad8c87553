//! Taxonomy Collaborator Types
//!
//! The vertical taxonomy and synonym table are loaded by an external
//! collaborator (typically from JSON config) and handed to the engine at
//! construction. Everything here is ordered `Vec`s on purpose: vertical
//! extraction is first-match-wins in taxonomy order, and query expansion
//! emits terms in first-seen order, so iteration order is part of the
//! contract rather than an accident of a hash map.

use serde::{Deserialize, Serialize};

/// A category label startups are classified under (e.g. "clean_energy").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertical {
    /// Stable id used in filters and on `Startup::primary_vertical`
    pub id: String,
    /// Display name, matched as a substring during filter extraction
    pub name: String,
    /// Keywords that signal this vertical in query text
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// One canonical term and the synonyms that should recall it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymGroup {
    /// The canonical term
    pub canonical: String,
    /// Terms considered equivalent to the canonical one
    pub synonyms: Vec<String>,
}

/// The full taxonomy handed to the query processor at construction.
/// Read-only thereafter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub verticals: Vec<Vertical>,
    #[serde(default)]
    pub synonyms: Vec<SynonymGroup>,
}

impl Taxonomy {
    /// Look up a vertical by id.
    pub fn vertical(&self, id: &str) -> Option<&Vertical> {
        self.verticals.iter().find(|v| v.id == id)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_from_json() {
        let json = r#"{
            "verticals": [
                {"id": "clean_energy", "name": "Clean Energy", "keywords": ["solar", "wind"]}
            ],
            "synonyms": [
                {"canonical": "ev", "synonyms": ["electric vehicle", "electric car"]}
            ]
        }"#;

        let taxonomy: Taxonomy = serde_json::from_str(json).unwrap();
        assert_eq!(taxonomy.verticals.len(), 1);
        assert_eq!(taxonomy.vertical("clean_energy").unwrap().name, "Clean Energy");
        assert_eq!(taxonomy.synonyms[0].synonyms.len(), 2);
    }

    #[test]
    fn test_vertical_lookup_missing() {
        let taxonomy = Taxonomy::default();
        assert!(taxonomy.vertical("nope").is_none());
    }
}
