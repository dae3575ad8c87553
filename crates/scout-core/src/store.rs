//! Record Store Boundary
//!
//! The engine indexes and ranks startup records but never owns them.
//! An external collaborator (database, API layer, fixture set) implements
//! [`RecordStore`]; the engine reads full snapshots during rebuild and
//! resolves individual ids while hydrating fused results.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

// ============================================================================
// STARTUP RECORD
// ============================================================================

/// A startup record, immutable per index snapshot.
///
/// Optional fields stay optional: a missing `founded_year` or
/// `total_funding_usd` is a real state the filter logic has to handle,
/// not a default to paper over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Startup {
    /// Stable identifier assigned by the record store
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub total_funding_usd: Option<f64>,
    /// Primary vertical id (e.g. "clean_energy"), if classified
    #[serde(default)]
    pub primary_vertical: Option<String>,
    #[serde(default)]
    pub secondary_verticals: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub headquarters_location: String,
}

impl Startup {
    /// Minimal constructor for the common case; optional fields start empty.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            short_description: String::new(),
            long_description: String::new(),
            founded_year: None,
            total_funding_usd: None,
            primary_vertical: None,
            secondary_verticals: Vec::new(),
            technologies: Vec::new(),
            keywords: Vec::new(),
            headquarters_location: String::new(),
        }
    }
}

// ============================================================================
// RECORD STORE TRAIT
// ============================================================================

/// Read-only view of the startup universe.
///
/// `get_all` is used only during index rebuild; `get_by_id` hydrates fused
/// hits at query time. A `None` from `get_by_id` means the index is stale
/// relative to the store, which the engine tolerates per hit.
pub trait RecordStore: Send + Sync {
    /// Look up a single record by id.
    fn get_by_id(&self, id: i64) -> Option<Startup>;

    /// Full snapshot of the universe, in store order.
    fn get_all(&self) -> Vec<Startup>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Vec-backed [`RecordStore`] for fixtures, tests, and small deployments.
///
/// Contents can be replaced wholesale, which models the external store
/// moving ahead of the engine's snapshot between rebuilds.
pub struct InMemoryRecordStore {
    records: RwLock<Vec<Startup>>,
}

impl InMemoryRecordStore {
    /// Create a store over the given records.
    pub fn new(records: Vec<Startup>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Replace the whole universe. Does not touch any engine snapshot;
    /// callers rebuild the engine to pick the change up.
    pub fn replace_all(&self, records: Vec<Startup>) {
        if let Ok(mut guard) = self.records.write() {
            *guard = records;
        }
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get_by_id(&self, id: i64) -> Option<Startup> {
        self.records
            .read()
            .ok()
            .and_then(|r| r.iter().find(|s| s.id == id).cloned())
    }

    fn get_all(&self) -> Vec<Startup> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

// ============================================================================
// TESTS
// ============================================================================
