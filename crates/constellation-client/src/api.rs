//! The API surface the store depends on.

use async_trait::async_trait;
use constellation_models::{
    BusFactorAnalysis, DependencyAnalysis, DirectionFilter, GraphStats, HealthStatus,
    ImpactAnalysis, Item, ItemDraft, ItemId, ItemPage, ItemQuery, ItemWithRelationships,
    ItemWithRelationshipsDraft, NewRelationship, Relationship, RelationshipCreated,
    RelationshipId,
};

use crate::error::Result;

/// One asynchronous call per CMDB endpoint.
///
/// [`ApiClient`](crate::ApiClient) is the HTTP implementation; tests can
/// substitute their own.
#[async_trait]
pub trait CmdbApi: Send + Sync {
    /// `GET /api/v1/cis/`
    async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage>;

    /// `GET /api/v1/cis/{id}`
    async fn get_item(&self, id: &ItemId) -> Result<Item>;

    /// `POST /api/v1/cis/`
    async fn create_item(&self, draft: &ItemDraft) -> Result<Item>;

    /// `POST /api/v1/cis/with-relationships`
    async fn create_item_with_relationships(
        &self,
        draft: &ItemWithRelationshipsDraft,
    ) -> Result<ItemWithRelationships>;

    /// `PUT /api/v1/cis/{id}`
    async fn update_item(&self, id: &ItemId, draft: &ItemDraft) -> Result<Item>;

    /// `DELETE /api/v1/cis/{id}`
    async fn delete_item(&self, id: &ItemId) -> Result<()>;

    /// `GET /api/v1/cis/{id}/relationships`
    async fn list_relationships(
        &self,
        id: &ItemId,
        direction: DirectionFilter,
    ) -> Result<Vec<Relationship>>;

    /// `GET /api/v1/relationships`
    async fn list_all_relationships(&self, limit: u32, offset: u32) -> Result<Vec<Relationship>>;

    /// `POST /api/v1/relationships`
    async fn create_relationship(&self, request: &NewRelationship) -> Result<RelationshipCreated>;

    /// `DELETE /api/v1/relationships/{id}`
    async fn delete_relationship(&self, id: &RelationshipId) -> Result<()>;

    /// `GET /api/v1/impact/{id}`
    async fn impact_analysis(&self, id: &ItemId, max_depth: u32) -> Result<ImpactAnalysis>;

    /// `GET /api/v1/dependencies/{id}`
    async fn dependency_analysis(&self, id: &ItemId, max_depth: u32)
        -> Result<DependencyAnalysis>;

    /// `GET /api/v1/busfactor`
    async fn bus_factor_analysis(&self) -> Result<BusFactorAnalysis>;

    /// `GET /api/v1/graph/stats`
    async fn graph_stats(&self) -> Result<GraphStats>;

    /// `GET /health`
    async fn health(&self) -> Result<HealthStatus>;
}
