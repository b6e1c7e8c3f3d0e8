//! Response payloads that wrap items.

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;
use crate::item::Item;
use crate::relationship::RelationshipType;

/// One page of items from the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPage {
    /// Items on this page; empty when the server omits the field.
    #[serde(default)]
    pub cis: Vec<Item>,
    /// Total number of items on the server.
    #[serde(default)]
    pub total_count: u64,
    /// Page size the server applied.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Offset the server applied.
    #[serde(default)]
    pub offset: Option<u32>,
}

/// A relationship created as part of create-with-relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRelationship {
    pub target_ci_id: ItemId,
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub description: Option<String>,
}

/// A relationship the server could not create, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRelationship {
    pub target_ci_id: ItemId,
    pub relationship_type: RelationshipType,
    pub error: String,
}

/// Result of creating an item together with its relationships.
///
/// Individual relationship failures do not fail the call; they are listed in
/// `failed_relationships`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWithRelationships {
    /// The created item.
    pub ci: Item,
    /// Relationships that were created.
    #[serde(default)]
    pub created_relationships: Vec<CreatedRelationship>,
    /// Relationships that failed.
    #[serde(default)]
    pub failed_relationships: Vec<FailedRelationship>,
    #[serde(default)]
    pub success: bool,
}

impl ItemWithRelationships {
    /// Returns true if every requested relationship was created.
    pub fn is_complete(&self) -> bool {
        self.failed_relationships.is_empty()
    }
}

/// Liveness response from `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    /// Returns true if the server reports itself healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }
}
