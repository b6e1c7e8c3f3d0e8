//! Relationship types for the CMDB graph.
//!
//! A relationship is a directed, typed edge between two items. The server
//! reports it either relative to a queried item (direction + related item) or
//! with both endpoints spelled out (list-all endpoint).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::ids::{ItemId, RelationshipId};
use crate::vocabulary::closed_vocabulary;

closed_vocabulary! {
    /// Type of a relationship between two items.
    RelationshipType ("relationship type") {
        /// Technical dependency.
        DependsOn => "DEPENDS_ON",
        /// Runs on a host or platform.
        RunsOn => "RUNS_ON",
        /// Hosts another item.
        Hosts => "HOSTS",
        /// Network connection.
        ConnectsTo => "CONNECTS_TO",
        /// Installed on a host.
        InstalledOn => "INSTALLED_ON",
        /// Uses another item.
        Uses => "USES",
        /// Produces data.
        Produces => "PRODUCES",
        /// Consumes data.
        Consumes => "CONSUMES",
        /// Processes data.
        Processes => "PROCESSES",
        /// Stores data.
        Stores => "STORES",
        /// Ownership.
        Owns => "OWNS",
        /// RACI: responsible.
        ResponsibleFor => "RESPONSIBLE_FOR",
        /// RACI: accountable.
        AccountableFor => "ACCOUNTABLE_FOR",
        /// RACI: consulted.
        ConsultedFor => "CONSULTED_FOR",
        /// RACI: informed.
        InformedFor => "INFORMED_FOR",
        /// Team membership.
        MemberOf => "MEMBER_OF",
        /// Holds a role.
        HasRole => "HAS_ROLE",
        /// Has a skill.
        HasSkill => "HAS_SKILL",
        /// Governed by a policy.
        GovernedBy => "GOVERNED_BY",
        /// Subject to a regulation.
        SubjectTo => "SUBJECT_TO",
        /// Complies with a standard.
        CompliesWith => "COMPLIES_WITH",
        /// Protects another item.
        Protects => "PROTECTS",
        /// Covers another item.
        Covers => "COVERS",
        /// Outsourced to a provider.
        OutsourcedTo => "OUTSOURCED_TO",
        /// Provided by a supplier.
        ProvidedBy => "PROVIDED_BY",
        /// Covered by a contract or SLA.
        CoveredBy => "COVERED_BY",
        /// Contracted with a party.
        ContractedWith => "CONTRACTED_WITH",
        /// Documents another item.
        Documents => "DOCUMENTS",
        /// Knows about another item.
        Knows => "KNOWS",
        /// References another item.
        References => "REFERENCES",
        /// Generic relation.
        RelatedTo => "RELATED_TO",
    }
}

/// Direction of a relationship relative to the queried item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The queried item is the target.
    Incoming,
    /// The queried item is the source.
    Outgoing,
}

/// Which relationships to fetch for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DirectionFilter {
    /// Only edges pointing at the item.
    Incoming,
    /// Only edges leaving the item.
    Outgoing,
    /// Both directions.
    #[default]
    Both,
}

impl DirectionFilter {
    /// Returns the query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectionFilter::Incoming => "incoming",
            DirectionFilter::Outgoing => "outgoing",
            DirectionFilter::Both => "both",
        }
    }
}

impl fmt::Display for DirectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DirectionFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "incoming" | "in" => Ok(DirectionFilter::Incoming),
            "outgoing" | "out" => Ok(DirectionFilter::Outgoing),
            "both" => Ok(DirectionFilter::Both),
            _ => Err(ParseError::unknown("direction", s)),
        }
    }
}

/// Reference to an item by id and display name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// Item ID.
    pub id: ItemId,
    /// Display name, if the server knows it.
    #[serde(default)]
    pub name: Option<String>,
}

impl ItemRef {
    /// Returns the name, falling back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Endpoints of a relationship, in whichever shape the server used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Endpoints {
    /// Relative to the item whose relationships were queried.
    Relative {
        /// Direction from the queried item's point of view.
        direction: Direction,
        /// The item on the other end.
        related_ci: ItemRef,
    },
    /// Both endpoints, as returned when listing all relationships.
    Absolute {
        /// Source item.
        from_ci: ItemRef,
        /// Target item.
        to_ci: ItemRef,
    },
}

/// A relationship as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship ID.
    pub id: RelationshipId,

    /// Relationship type.
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,

    /// Endpoints of the edge.
    #[serde(flatten)]
    pub endpoints: Endpoints,

    /// Creation timestamp as reported by the server.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Relationship {
    /// Returns true if the edge touches the given item.
    ///
    /// For relative records only the related end is known, so this checks
    /// the related item.
    pub fn involves(&self, id: &ItemId) -> bool {
        match &self.endpoints {
            Endpoints::Relative { related_ci, .. } => &related_ci.id == id,
            Endpoints::Absolute { from_ci, to_ci } => &from_ci.id == id || &to_ci.id == id,
        }
    }
}

/// Request body for creating a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelationship {
    /// Source item.
    pub from_ci_id: ItemId,
    /// Target item.
    pub to_ci_id: ItemId,
    /// Relationship type.
    pub relationship_type: RelationshipType,
    /// Optional human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRelationship {
    /// Creates a request without a description.
    pub fn new(
        from: impl Into<ItemId>,
        to: impl Into<ItemId>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            from_ci_id: from.into(),
            to_ci_id: to.into(),
            relationship_type,
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true if `id` is either endpoint.
    pub fn touches(&self, id: &ItemId) -> bool {
        &self.from_ci_id == id || &self.to_ci_id == id
    }
}

/// Server acknowledgement of a created relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipCreated {
    /// Confirmation message.
    #[serde(default)]
    pub message: String,
    /// Source item.
    pub from_ci: ItemId,
    /// Target item.
    pub to_ci: ItemId,
    /// Relationship type as echoed by the server.
    #[serde(rename = "type")]
    pub relationship_type: String,
}
