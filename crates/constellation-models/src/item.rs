//! Configuration item (CI) types.
//!
//! An [`Item`] is any tracked asset, tangible (server, database, service) or
//! intangible (person, policy, license, process). Records are always produced
//! by the server; the client never mutates a field outside a store action.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::ids::ItemId;
use crate::vocabulary::open_vocabulary;

/// Criticality level of an item.
///
/// Ordered: `Critical > High > Medium > Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criticality {
    /// Low impact if unavailable.
    Low,
    /// Default level for new items.
    #[default]
    Medium,
    /// High impact if unavailable.
    High,
    /// Business critical.
    Critical,
}

impl Criticality {
    /// All levels, most critical first.
    pub const ALL: [Criticality; 4] = [
        Criticality::Critical,
        Criticality::High,
        Criticality::Medium,
        Criticality::Low,
    ];

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Low => "LOW",
            Criticality::Medium => "MEDIUM",
            Criticality::High => "HIGH",
            Criticality::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Criticality {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criticality::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::unknown("criticality", s))
    }
}

open_vocabulary! {
    /// Kind of configuration item.
    CiType {
        /// Physical hardware.
        Hardware => "HARDWARE",
        /// Installed software.
        Software => "SOFTWARE",
        /// Network equipment or segment.
        Network => "NETWORK",
        /// Business application.
        Application => "APPLICATION",
        /// Running service.
        Service => "SERVICE",
        /// Network-reachable endpoint.
        Endpoint => "ENDPOINT",
        /// Data set.
        Dataset => "DATASET",
        /// Database instance.
        Database => "DATABASE",
        /// Physical or logical location.
        Location => "LOCATION",
        /// Facility such as a data centre.
        Facility => "FACILITY",
        /// Identity (account, principal).
        Identity => "IDENTITY",
        /// Credential (key, certificate).
        Credential => "CREDENTIAL",
        /// Generic fallback type.
        Generic => "GENERIC",
    }
}

impl Default for CiType {
    fn default() -> Self {
        CiType::Generic
    }
}

open_vocabulary! {
    /// Deployment environment of an item.
    Environment {
        /// Production.
        Production => "PROD",
        /// Staging.
        Staging => "STAGING",
        /// Development.
        Development => "DEV",
        /// Testing.
        Testing => "TEST",
        /// Sandbox.
        Sandbox => "SANDBOX",
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Production
    }
}

open_vocabulary! {
    /// Lifecycle state of an item.
    LifecycleState {
        /// Planned but not yet deployed.
        Planned => "PLANNED",
        /// In service.
        Active => "ACTIVE",
        /// Still running, scheduled for removal.
        Deprecated => "DEPRECATED",
        /// Removed from service.
        Retired => "RETIRED",
        /// State not known.
        Unknown => "UNKNOWN",
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Active
    }
}

open_vocabulary! {
    /// Top-level asset category.
    AssetCategory {
        /// Physical or technical asset.
        Tangible => "tangible",
        /// People, governance, contracts, processes, knowledge.
        Intangible => "intangible",
    }
}

open_vocabulary! {
    /// Sub-type of an intangible asset.
    IntangibleType {
        /// A person.
        Human => "human",
        /// A team.
        Team => "team",
        /// A role.
        Role => "role",
        /// A policy.
        Policy => "policy",
        /// A procedure.
        Procedure => "procedure",
        /// A standard.
        Standard => "standard",
        /// A license.
        License => "license",
        /// A contract.
        Contract => "contract",
        /// A service level agreement.
        Sla => "sla",
        /// A business process.
        Process => "process",
        /// A workflow.
        Workflow => "workflow",
        /// Tacit knowledge.
        Knowledge => "knowledge",
        /// Written documentation.
        Documentation => "documentation",
        /// A virtual machine.
        VirtualMachine => "virtual_machine",
        /// A container.
        Container => "container",
        /// A software package.
        Software => "software",
        /// An API.
        Api => "api",
        /// A microservice.
        Microservice => "microservice",
    }
}

/// A configuration item as returned by the server.
///
/// Fields the client does not model are kept in [`Item::extra`], so a stored
/// record carries everything the server sent. Modelled optional fields that
/// the server reported as `null` are omitted when serialized; reading the
/// output back yields an equal `Item`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Server-assigned identifier.
    pub id: ItemId,

    /// Display name.
    pub name: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Kind of item.
    #[serde(default)]
    pub ci_type: CiType,

    /// Criticality level.
    #[serde(default)]
    pub criticality: Criticality,

    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,

    /// Lifecycle state.
    #[serde(default)]
    pub lifecycle_state: LifecycleState,

    /// Asset category (absent means tangible).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<AssetCategory>,

    /// Sub-type for intangible assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intangible_type: Option<IntangibleType>,

    /// Network hostname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Primary IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// Fully qualified domain name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,

    /// Vendor or manufacturer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    /// Model or product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Serial number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    /// Organisation asset tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,

    /// Physical or logical location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// ID of the owning person or team.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Whether monitoring is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_enabled: Option<bool>,

    /// Whether backup is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_enabled: Option<bool>,

    /// Custom key-value attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<serde_json::Map<String, serde_json::Value>>,

    /// Creation timestamp as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Last update timestamp as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Any other fields sent by the server.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Item {
    /// Creates an item with the given identity and defaults elsewhere.
    ///
    /// Real items come from the server; this is mainly useful for fixtures.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, criticality: Criticality) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            ci_type: CiType::default(),
            criticality,
            environment: Environment::default(),
            lifecycle_state: LifecycleState::default(),
            category: None,
            intangible_type: None,
            hostname: None,
            ip_address: None,
            fqdn: None,
            vendor: None,
            model: None,
            serial_number: None,
            asset_tag: None,
            location: None,
            owner: None,
            monitoring_enabled: None,
            backup_enabled: None,
            custom_attributes: None,
            created_at: None,
            updated_at: None,
            extra: BTreeMap::new(),
        }
    }

    /// Sets the CI type.
    pub fn with_ci_type(mut self, ci_type: impl Into<CiType>) -> Self {
        self.ci_type = ci_type.into();
        self
    }

    /// Marks the item as an intangible asset of the given sub-type.
    pub fn with_intangible_type(mut self, intangible_type: IntangibleType) -> Self {
        self.category = Some(AssetCategory::Intangible);
        self.intangible_type = Some(intangible_type);
        self
    }

    /// Returns the asset category, defaulting to tangible.
    pub fn category(&self) -> AssetCategory {
        self.category.clone().unwrap_or(AssetCategory::Tangible)
    }

    /// Returns true if the item is an intangible asset.
    pub fn is_intangible(&self) -> bool {
        self.category() == AssetCategory::Intangible
    }
}
