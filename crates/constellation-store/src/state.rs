//! The mirrored state and its read-only views.

use serde::Serialize;

use constellation_models::{
    BusFactorAnalysis, Criticality, DependencyAnalysis, GraphStats, ImpactAnalysis, Item,
    ItemId, Relationship,
};

use crate::action::ActionLog;

/// Everything the store owns. Only store actions mutate it.
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    pub items: Vec<Item>,
    pub selected: Option<Item>,
    pub relationships: Vec<Relationship>,
    pub impact_analysis: Option<ImpactAnalysis>,
    pub dependency_analysis: Option<DependencyAnalysis>,
    pub bus_factor_analysis: Option<BusFactorAnalysis>,
    pub graph_stats: Option<GraphStats>,
    pub error: Option<String>,
    pub actions: ActionLog,
}

impl StoreState {
    pub fn with_history(capacity: usize) -> Self {
        Self {
            actions: ActionLog::new(capacity),
            ..Self::default()
        }
    }

    /// Appends a created item.
    pub fn push_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Replaces the item with the same id, and the selection if it matches.
    /// Items not already mirrored are not added.
    pub fn replace_item(&mut self, item: &Item) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == item.id) {
            *slot = item.clone();
        }
        if self.selected.as_ref().is_some_and(|s| s.id == item.id) {
            self.selected = Some(item.clone());
        }
    }

    /// Removes the item and clears the selection if it matches.
    pub fn remove_item(&mut self, id: &ItemId) {
        self.items.retain(|i| &i.id != id);
        if self.selected.as_ref().is_some_and(|s| &s.id == id) {
            self.selected = None;
        }
    }

    pub fn selected_id(&self) -> Option<ItemId> {
        self.selected.as_ref().map(|s| s.id.clone())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            items: self.items.clone(),
            selected: self.selected.clone(),
            relationships: self.relationships.clone(),
            impact_analysis: self.impact_analysis.clone(),
            dependency_analysis: self.dependency_analysis.clone(),
            bus_factor_analysis: self.bus_factor_analysis.clone(),
            graph_stats: self.graph_stats.clone(),
            loading: self.actions.has_pending(),
            error: self.error.clone(),
        }
    }
}

/// A consistent copy of the store at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub items: Vec<Item>,
    pub selected: Option<Item>,
    pub relationships: Vec<Relationship>,
    pub impact_analysis: Option<ImpactAnalysis>,
    pub dependency_analysis: Option<DependencyAnalysis>,
    pub bus_factor_analysis: Option<BusFactorAnalysis>,
    pub graph_stats: Option<GraphStats>,
    /// True while any action is in flight.
    pub loading: bool,
    /// Message of the most recent failure since the last reset.
    pub error: Option<String>,
}

impl StoreSnapshot {
    /// Number of mirrored items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items rated CRITICAL.
    pub fn critical_items(&self) -> Vec<Item> {
        with_criticality(&self.items, Criticality::Critical)
    }

    /// Items rated HIGH.
    pub fn high_items(&self) -> Vec<Item> {
        with_criticality(&self.items, Criticality::High)
    }
}

/// Items with exactly the given criticality, in collection order.
pub fn with_criticality(items: &[Item], criticality: Criticality) -> Vec<Item> {
    items
        .iter()
        .filter(|i| i.criticality == criticality)
        .cloned()
        .collect()
}
