//! Core data models for the Constellation CMDB client.
//!
//! This crate provides the typed records exchanged with the CMDB API:
//! configuration items, relationships, server-side analysis snapshots, and
//! the request bodies used to create and update them.

pub mod analysis;
pub mod draft;
pub mod error;
pub mod ids;
pub mod item;
pub mod presentation;
pub mod relationship;
pub mod responses;
mod vocabulary;

pub use analysis::{
    BusFactorAnalysis, BusFactorEntry, DependencyAnalysis, GraphStats, ImpactAnalysis,
    ReachedItem, DEFAULT_MAX_DEPTH,
};
pub use draft::{ItemDraft, ItemQuery, ItemWithRelationshipsDraft, RelationshipSpec};
pub use error::ParseError;
pub use ids::{ItemId, RelationshipId};
pub use item::{AssetCategory, CiType, Criticality, Environment, IntangibleType, Item, LifecycleState};
pub use relationship::{
    Direction, DirectionFilter, Endpoints, ItemRef, NewRelationship, Relationship,
    RelationshipCreated, RelationshipType,
};
pub use responses::{
    CreatedRelationship, FailedRelationship, HealthStatus, ItemPage, ItemWithRelationships,
};
