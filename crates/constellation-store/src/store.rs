//! CmdbStore - the async client state store.
//!
//! # Action Contract
//!
//! Every action follows the same three phases:
//!
//! 1. **Start**: clear the last error and register a pending [`ActionId`].
//! 2. **Execute**: call the API with no lock held.
//! 3. **Settle**: under one write lock, apply the mutation on success or
//!    record the failure message, then settle the action record.
//!
//! Failures are returned to the caller unchanged after being recorded.
//! An action whose future is dropped before it settles is recorded as
//! [`ActionStatus::Cancelled`] and applies nothing.
//!
//! Each action has a `*_tracked` variant returning [`Tracked`], which carries
//! the [`ActionId`] of that invocation alongside its result.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use constellation_client::{ClientError, CmdbApi, Result};
use constellation_models::{
    BusFactorAnalysis, Criticality, DependencyAnalysis, DirectionFilter, GraphStats,
    ImpactAnalysis, Item, ItemDraft, ItemId, ItemPage, ItemQuery, ItemWithRelationships,
    ItemWithRelationshipsDraft, NewRelationship, Relationship, RelationshipCreated,
    RelationshipId, DEFAULT_MAX_DEPTH,
};

use crate::action::{ActionId, ActionKind, ActionRecord, ActionStatus, Tracked};
use crate::state::{with_criticality, StoreSnapshot, StoreState};

/// Page size used by [`CmdbStore::fetch_all_relationships`] when none is given.
pub const DEFAULT_RELATIONSHIP_LIMIT: u32 = 1000;

/// In-memory mirror of CMDB state with a uniform loading/error contract.
///
/// # Concurrency
///
/// Cloning is cheap and every clone shares the same state behind a single
/// `tokio::sync::RwLock`. Actions may run concurrently; each mutation is
/// applied atomically when its call settles, so readers never observe a
/// partially updated collection.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use constellation_client::ApiClient;
/// use constellation_models::ItemQuery;
/// use constellation_store::CmdbStore;
///
/// let store = CmdbStore::new(Arc::new(ApiClient::from_env()?));
/// store.fetch_items(&ItemQuery::new()).await?;
/// println!("{} critical items", store.critical_items().await.len());
/// ```
#[derive(Clone)]
pub struct CmdbStore {
    api: Arc<dyn CmdbApi>,
    state: Arc<RwLock<StoreState>>,
}

impl CmdbStore {
    /// Creates a store backed by the given API.
    pub fn new(api: Arc<dyn CmdbApi>) -> Self {
        Self::from_state(api, StoreState::default())
    }

    /// Creates a store retaining up to `capacity` settled action records.
    pub fn with_action_history(api: Arc<dyn CmdbApi>, capacity: usize) -> Self {
        Self::from_state(api, StoreState::with_history(capacity))
    }

    fn from_state(api: Arc<dyn CmdbApi>, state: StoreState) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Start phase.
    async fn begin(&self, kind: ActionKind) -> ActionGuard {
        let mut state = self.state.write().await;
        state.error = None;
        let id = state.actions.start(kind);
        debug!(action = %id, kind = %kind, "Action started");
        ActionGuard {
            state: Arc::clone(&self.state),
            id,
            kind,
            settled: false,
        }
    }

    /// Settle phase. `apply` runs only on success.
    async fn settle<T>(
        &self,
        mut guard: ActionGuard,
        result: Result<T>,
        apply: impl FnOnce(&mut StoreState, &T),
    ) -> Tracked<T> {
        let (id, kind) = (guard.id, guard.kind);
        let mut state = self.state.write().await;
        match &result {
            Ok(value) => {
                apply(&mut state, value);
                state.actions.settle(id, ActionStatus::Succeeded);
                debug!(action = %id, kind = %kind, "Action succeeded");
            }
            Err(err) => {
                let message = failure_message(kind, err);
                warn!(action = %id, kind = %kind, error = %message, "Action failed");
                state.error = Some(message.clone());
                state.actions.settle(id, ActionStatus::Failed(message));
            }
        }
        guard.settled = true;
        Tracked { id, result }
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Lists items and replaces the mirrored collection with the result.
    pub async fn fetch_items(&self, query: &ItemQuery) -> Result<ItemPage> {
        self.fetch_items_tracked(query).await.into_result()
    }

    pub async fn fetch_items_tracked(&self, query: &ItemQuery) -> Tracked<ItemPage> {
        let guard = self.begin(ActionKind::FetchItems).await;
        let result = self.api.list_items(query).await;
        self.settle(guard, result, |state, page| {
            state.items = page.cis.clone();
        })
        .await
    }

    /// Fetches one item and makes it the selection.
    pub async fn fetch_item(&self, item_id: &ItemId) -> Result<Item> {
        self.fetch_item_tracked(item_id).await.into_result()
    }

    pub async fn fetch_item_tracked(&self, item_id: &ItemId) -> Tracked<Item> {
        let guard = self.begin(ActionKind::FetchItem).await;
        let result = self.api.get_item(item_id).await;
        self.settle(guard, result, |state, item| {
            state.selected = Some(item.clone());
        })
        .await
    }

    /// Creates an item and appends it to the collection.
    pub async fn create_item(&self, draft: &ItemDraft) -> Result<Item> {
        self.create_item_tracked(draft).await.into_result()
    }

    pub async fn create_item_tracked(&self, draft: &ItemDraft) -> Tracked<Item> {
        let guard = self.begin(ActionKind::CreateItem).await;
        let result = self.api.create_item(draft).await;
        self.settle(guard, result, |state, item| {
            state.push_item(item.clone());
        })
        .await
    }

    /// Creates an item with relationships and appends the item.
    ///
    /// Per-relationship failures are reported in the result, not as an error.
    pub async fn create_item_with_relationships(
        &self,
        draft: &ItemWithRelationshipsDraft,
    ) -> Result<ItemWithRelationships> {
        self.create_item_with_relationships_tracked(draft)
            .await
            .into_result()
    }

    pub async fn create_item_with_relationships_tracked(
        &self,
        draft: &ItemWithRelationshipsDraft,
    ) -> Tracked<ItemWithRelationships> {
        let guard = self.begin(ActionKind::CreateItemWithRelationships).await;
        let result = self.api.create_item_with_relationships(draft).await;
        self.settle(guard, result, |state, created| {
            state.push_item(created.ci.clone());
        })
        .await
    }

    /// Updates an item, replacing the mirrored record and selection in place.
    pub async fn update_item(&self, item_id: &ItemId, draft: &ItemDraft) -> Result<Item> {
        self.update_item_tracked(item_id, draft).await.into_result()
    }

    pub async fn update_item_tracked(&self, item_id: &ItemId, draft: &ItemDraft) -> Tracked<Item> {
        let guard = self.begin(ActionKind::UpdateItem).await;
        let result = self.api.update_item(item_id, draft).await;
        self.settle(guard, result, |state, item| {
            state.replace_item(item);
        })
        .await
    }

    /// Deletes an item and drops it from the collection and selection.
    pub async fn delete_item(&self, item_id: &ItemId) -> Result<()> {
        self.delete_item_tracked(item_id).await.into_result()
    }

    pub async fn delete_item_tracked(&self, item_id: &ItemId) -> Tracked<()> {
        let guard = self.begin(ActionKind::DeleteItem).await;
        let result = self.api.delete_item(item_id).await;
        self.settle(guard, result, |state, _| {
            state.remove_item(item_id);
        })
        .await
    }

    // ------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------

    /// Fetches an item's relationships and replaces the relationship collection.
    pub async fn fetch_relationships(
        &self,
        item_id: &ItemId,
        direction: DirectionFilter,
    ) -> Result<Vec<Relationship>> {
        self.fetch_relationships_tracked(item_id, direction)
            .await
            .into_result()
    }

    pub async fn fetch_relationships_tracked(
        &self,
        item_id: &ItemId,
        direction: DirectionFilter,
    ) -> Tracked<Vec<Relationship>> {
        let guard = self.begin(ActionKind::FetchRelationships).await;
        let result = self.api.list_relationships(item_id, direction).await;
        self.settle(guard, result, |state, relationships| {
            state.relationships = relationships.clone();
        })
        .await
    }

    /// Fetches all relationships (offset 0) and replaces the collection.
    ///
    /// `limit` defaults to [`DEFAULT_RELATIONSHIP_LIMIT`].
    pub async fn fetch_all_relationships(&self, limit: Option<u32>) -> Result<Vec<Relationship>> {
        self.fetch_all_relationships_tracked(limit)
            .await
            .into_result()
    }

    pub async fn fetch_all_relationships_tracked(
        &self,
        limit: Option<u32>,
    ) -> Tracked<Vec<Relationship>> {
        let guard = self.begin(ActionKind::FetchAllRelationships).await;
        let limit = limit.unwrap_or(DEFAULT_RELATIONSHIP_LIMIT);
        let result = self.api.list_all_relationships(limit, 0).await;
        self.settle(guard, result, |state, relationships| {
            state.relationships = relationships.clone();
        })
        .await
    }

    /// Creates a relationship.
    ///
    /// If the selected item is either endpoint, its relationships (both
    /// directions) are fetched again and replace the collection. A failed
    /// refresh fails the action.
    pub async fn create_relationship(&self, request: &NewRelationship) -> Result<RelationshipCreated> {
        self.create_relationship_tracked(request)
            .await
            .into_result()
    }

    pub async fn create_relationship_tracked(
        &self,
        request: &NewRelationship,
    ) -> Tracked<RelationshipCreated> {
        let guard = self.begin(ActionKind::CreateRelationship).await;
        let result = self.create_and_refresh(request).await;
        let Tracked { id, result } = self
            .settle(guard, result, |state, (_, refreshed)| {
                if let Some(relationships) = refreshed {
                    state.relationships = relationships.clone();
                }
            })
            .await;
        Tracked {
            id,
            result: result.map(|(created, _)| created),
        }
    }

    async fn create_and_refresh(
        &self,
        request: &NewRelationship,
    ) -> Result<(RelationshipCreated, Option<Vec<Relationship>>)> {
        let created = self.api.create_relationship(request).await?;
        let selected = self.state.read().await.selected_id();
        let refreshed = match selected {
            Some(selected) if request.touches(&selected) => {
                debug!(item_id = %selected, "Refreshing relationships of selected item");
                Some(
                    self.api
                        .list_relationships(&selected, DirectionFilter::Both)
                        .await?,
                )
            }
            _ => None,
        };
        Ok((created, refreshed))
    }

    /// Deletes a relationship. The mirrored collection is left as is.
    pub async fn delete_relationship(&self, relationship_id: &RelationshipId) -> Result<()> {
        self.delete_relationship_tracked(relationship_id)
            .await
            .into_result()
    }

    pub async fn delete_relationship_tracked(&self, relationship_id: &RelationshipId) -> Tracked<()> {
        let guard = self.begin(ActionKind::DeleteRelationship).await;
        let result = self.api.delete_relationship(relationship_id).await;
        self.settle(guard, result, |_, _| {}).await
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    /// Fetches impact analysis; `max_depth` defaults to 3.
    pub async fn fetch_impact_analysis(
        &self,
        item_id: &ItemId,
        max_depth: Option<u32>,
    ) -> Result<ImpactAnalysis> {
        self.fetch_impact_analysis_tracked(item_id, max_depth)
            .await
            .into_result()
    }

    pub async fn fetch_impact_analysis_tracked(
        &self,
        item_id: &ItemId,
        max_depth: Option<u32>,
    ) -> Tracked<ImpactAnalysis> {
        let guard = self.begin(ActionKind::FetchImpactAnalysis).await;
        let result = self
            .api
            .impact_analysis(item_id, max_depth.unwrap_or(DEFAULT_MAX_DEPTH))
            .await;
        self.settle(guard, result, |state, analysis| {
            state.impact_analysis = Some(analysis.clone());
        })
        .await
    }

    /// Fetches dependency analysis; `max_depth` defaults to 3.
    pub async fn fetch_dependency_analysis(
        &self,
        item_id: &ItemId,
        max_depth: Option<u32>,
    ) -> Result<DependencyAnalysis> {
        self.fetch_dependency_analysis_tracked(item_id, max_depth)
            .await
            .into_result()
    }

    pub async fn fetch_dependency_analysis_tracked(
        &self,
        item_id: &ItemId,
        max_depth: Option<u32>,
    ) -> Tracked<DependencyAnalysis> {
        let guard = self.begin(ActionKind::FetchDependencyAnalysis).await;
        let result = self
            .api
            .dependency_analysis(item_id, max_depth.unwrap_or(DEFAULT_MAX_DEPTH))
            .await;
        self.settle(guard, result, |state, analysis| {
            state.dependency_analysis = Some(analysis.clone());
        })
        .await
    }

    pub async fn fetch_bus_factor_analysis(&self) -> Result<BusFactorAnalysis> {
        self.fetch_bus_factor_analysis_tracked().await.into_result()
    }

    pub async fn fetch_bus_factor_analysis_tracked(&self) -> Tracked<BusFactorAnalysis> {
        let guard = self.begin(ActionKind::FetchBusFactorAnalysis).await;
        let result = self.api.bus_factor_analysis().await;
        self.settle(guard, result, |state, analysis| {
            state.bus_factor_analysis = Some(analysis.clone());
        })
        .await
    }

    pub async fn fetch_graph_stats(&self) -> Result<GraphStats> {
        self.fetch_graph_stats_tracked().await.into_result()
    }

    pub async fn fetch_graph_stats_tracked(&self) -> Tracked<GraphStats> {
        let guard = self.begin(ActionKind::FetchGraphStats).await;
        let result = self.api.graph_stats().await;
        self.settle(guard, result, |state, stats| {
            state.graph_stats = Some(stats.clone());
        })
        .await
    }

    // ------------------------------------------------------------------
    // Local actions
    // ------------------------------------------------------------------

    /// Resets the last error.
    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    /// Sets or clears the selection without contacting the server.
    pub async fn set_selected_item(&self, item: Option<Item>) {
        self.state.write().await.selected = item;
    }

    /// Returns the underlying API.
    pub fn api(&self) -> &Arc<dyn CmdbApi> {
        &self.api
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Returns a consistent copy of the whole store.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn items(&self) -> Vec<Item> {
        self.state.read().await.items.clone()
    }

    pub async fn selected_item(&self) -> Option<Item> {
        self.state.read().await.selected.clone()
    }

    pub async fn relationships(&self) -> Vec<Relationship> {
        self.state.read().await.relationships.clone()
    }

    pub async fn impact_analysis(&self) -> Option<ImpactAnalysis> {
        self.state.read().await.impact_analysis.clone()
    }

    pub async fn dependency_analysis(&self) -> Option<DependencyAnalysis> {
        self.state.read().await.dependency_analysis.clone()
    }

    pub async fn bus_factor_analysis(&self) -> Option<BusFactorAnalysis> {
        self.state.read().await.bus_factor_analysis.clone()
    }

    pub async fn graph_stats(&self) -> Option<GraphStats> {
        self.state.read().await.graph_stats.clone()
    }

    /// True while any action is in flight.
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.actions.has_pending()
    }

    /// Message of the most recent failure, if not cleared since.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Number of mirrored items.
    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }

    /// Mirrored items rated CRITICAL.
    pub async fn critical_items(&self) -> Vec<Item> {
        with_criticality(&self.state.read().await.items, Criticality::Critical)
    }

    /// Mirrored items rated HIGH.
    pub async fn high_items(&self) -> Vec<Item> {
        with_criticality(&self.state.read().await.items, Criticality::High)
    }

    // ------------------------------------------------------------------
    // Action tracking
    // ------------------------------------------------------------------

    /// Status of one invocation, if still retained.
    pub async fn action_status(&self, id: ActionId) -> Option<ActionStatus> {
        self.state
            .read()
            .await
            .actions
            .get(id)
            .map(|r| r.status.clone())
    }

    /// Most recent invocation of `kind`.
    pub async fn last_action(&self, kind: ActionKind) -> Option<ActionRecord> {
        self.state.read().await.actions.last_of(kind).cloned()
    }

    /// Invocations currently in flight, oldest first.
    pub async fn pending_actions(&self) -> Vec<ActionRecord> {
        self.state.read().await.actions.pending().cloned().collect()
    }

    /// All retained invocations, oldest first.
    pub async fn action_history(&self) -> Vec<ActionRecord> {
        self.state.read().await.actions.iter().cloned().collect()
    }
}

/// Pending action registration. Dropped before `settle` runs,
/// it marks the action cancelled.
struct ActionGuard {
    state: Arc<RwLock<StoreState>>,
    id: ActionId,
    kind: ActionKind,
    settled: bool,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let (id, kind) = (self.id, self.kind);
        debug!(action = %id, kind = %kind, "Action cancelled");
        match self.state.try_write() {
            Ok(mut state) => {
                state.actions.settle(id, ActionStatus::Cancelled);
            }
            Err(_) => {
                // Lock busy: settle once it frees up.
                let state = Arc::clone(&self.state);
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        state.write().await.actions.settle(id, ActionStatus::Cancelled);
                    });
                }
            }
        }
    }
}

fn failure_message(kind: ActionKind, err: &ClientError) -> String {
    err.message()
        .unwrap_or_else(|| kind.fallback_message().to_string())
}
