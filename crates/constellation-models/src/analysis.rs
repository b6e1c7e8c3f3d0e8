//! Analysis snapshots computed by the server.
//!
//! These are opaque, read-only results: the client stores and displays them
//! but never recomputes them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::ItemId;
use crate::item::{CiType, Criticality};

/// Default traversal depth for impact and dependency analysis.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// An item reached during a traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachedItem {
    pub ci_id: ItemId,
    pub ci_name: String,
    /// Absent when the item has no criticality recorded.
    #[serde(default)]
    pub criticality: Option<Criticality>,
    /// Hops from the source item.
    pub distance: u32,
    /// Relationship types along the path.
    #[serde(default)]
    pub relationship_chain: Vec<String>,
}

/// Which items are affected if the source item fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub source_ci: ItemId,
    pub total_impacted: u64,
    #[serde(default)]
    pub impacted_cis: Vec<ReachedItem>,
    /// Impacted item count per criticality level.
    #[serde(default)]
    pub criticality_breakdown: BTreeMap<String, u64>,
    pub risk_score: f64,
    pub max_depth_analyzed: u32,
}

impl ImpactAnalysis {
    /// Returns the impacted count for one criticality level.
    pub fn impacted_at(&self, criticality: Criticality) -> u64 {
        self.criticality_breakdown
            .get(criticality.as_str())
            .copied()
            .unwrap_or(0)
    }
}

/// What the source item depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub source_ci: ItemId,
    pub total_dependencies: u64,
    #[serde(default)]
    pub dependencies: Vec<ReachedItem>,
    pub max_depth_analyzed: u32,
}

/// An item with concentrated dependency risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusFactorEntry {
    pub ci_id: ItemId,
    pub ci_name: String,
    #[serde(default)]
    pub ci_type: Option<CiType>,
    #[serde(default)]
    pub criticality: Option<Criticality>,
    /// Number of items depending on this one.
    pub dependency_count: u64,
    pub risk_score: f64,
}

/// Bus-factor risk across all items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusFactorAnalysis {
    #[serde(default)]
    pub high_risk_cis: Vec<BusFactorEntry>,
    pub total_analyzed: u64,
    #[serde(default)]
    pub analysis_date: String,
}

/// Overall graph statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    #[serde(default)]
    pub total_cis: u64,
    #[serde(default)]
    pub total_relationships: u64,
    #[serde(default)]
    pub unique_relationship_types: u64,
    #[serde(default)]
    pub relationship_type_breakdown: BTreeMap<String, u64>,
}
