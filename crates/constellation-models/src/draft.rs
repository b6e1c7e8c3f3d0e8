//! Request bodies and query parameters sent to the server.

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;
use crate::item::{AssetCategory, CiType, Criticality, Environment, IntangibleType, LifecycleState};
use crate::relationship::RelationshipType;

/// A partial item used as the body of create and update calls.
///
/// Unset fields are omitted from the JSON body, so an update only touches
/// what the caller supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_type: Option<CiType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<LifecycleState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<AssetCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intangible_type: Option<IntangibleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ItemDraft {
    /// Starts a draft with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the CI type.
    pub fn ci_type(mut self, ci_type: impl Into<CiType>) -> Self {
        self.ci_type = Some(ci_type.into());
        self
    }

    /// Sets the criticality.
    pub fn criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = Some(criticality);
        self
    }

    /// Sets the environment.
    pub fn environment(mut self, environment: impl Into<Environment>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Sets the lifecycle state.
    pub fn lifecycle_state(mut self, state: impl Into<LifecycleState>) -> Self {
        self.lifecycle_state = Some(state.into());
        self
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A relationship to create alongside a new item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSpec {
    /// Item the new item should point at.
    pub target_ci_id: ItemId,
    /// Relationship type.
    pub relationship_type: RelationshipType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RelationshipSpec {
    /// Creates an entry without a description.
    pub fn new(target: impl Into<ItemId>, relationship_type: RelationshipType) -> Self {
        Self {
            target_ci_id: target.into(),
            relationship_type,
            description: None,
        }
    }
}

/// Body of the create-with-relationships call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemWithRelationshipsDraft {
    /// The item fields.
    #[serde(flatten)]
    pub item: ItemDraft,
    /// Relationships from the new item to existing ones.
    #[serde(default)]
    pub relationships: Vec<RelationshipSpec>,
}

impl ItemWithRelationshipsDraft {
    /// Wraps a draft with no relationships yet.
    pub fn new(item: ItemDraft) -> Self {
        Self {
            item,
            relationships: Vec::new(),
        }
    }

    /// Adds a relationship.
    pub fn relate(mut self, spec: RelationshipSpec) -> Self {
        self.relationships.push(spec);
        self
    }
}

/// Query parameters for listing items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_type: Option<CiType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl ItemQuery {
    /// Creates an empty query (server defaults apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text search.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Filters by criticality.
    pub fn criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = Some(criticality);
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the page offset.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}
