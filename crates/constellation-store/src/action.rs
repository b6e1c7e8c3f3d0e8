//! Per-invocation action tracking.
//!
//! Every store action registers an [`ActionRecord`] when it starts and
//! settles it when the API call returns. The store is "loading" while any
//! record is pending.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use constellation_client::ClientError;

/// Number of action records kept by default.
pub const DEFAULT_ACTION_HISTORY: usize = 256;

/// Identifier of one action invocation, unique per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(u64);

impl ActionId {
    /// Returns the numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The store action an invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    FetchItems,
    FetchItem,
    CreateItem,
    CreateItemWithRelationships,
    UpdateItem,
    DeleteItem,
    FetchRelationships,
    FetchAllRelationships,
    CreateRelationship,
    DeleteRelationship,
    FetchImpactAnalysis,
    FetchDependencyAnalysis,
    FetchBusFactorAnalysis,
    FetchGraphStats,
}

impl ActionKind {
    /// Returns the snake_case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::FetchItems => "fetch_items",
            ActionKind::FetchItem => "fetch_item",
            ActionKind::CreateItem => "create_item",
            ActionKind::CreateItemWithRelationships => "create_item_with_relationships",
            ActionKind::UpdateItem => "update_item",
            ActionKind::DeleteItem => "delete_item",
            ActionKind::FetchRelationships => "fetch_relationships",
            ActionKind::FetchAllRelationships => "fetch_all_relationships",
            ActionKind::CreateRelationship => "create_relationship",
            ActionKind::DeleteRelationship => "delete_relationship",
            ActionKind::FetchImpactAnalysis => "fetch_impact_analysis",
            ActionKind::FetchDependencyAnalysis => "fetch_dependency_analysis",
            ActionKind::FetchBusFactorAnalysis => "fetch_bus_factor_analysis",
            ActionKind::FetchGraphStats => "fetch_graph_stats",
        }
    }

    /// Message recorded when a failure carries no text of its own.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            ActionKind::FetchItems => "Failed to fetch CIs",
            ActionKind::FetchItem => "Failed to fetch CI",
            ActionKind::CreateItem => "Failed to create CI",
            ActionKind::CreateItemWithRelationships => "Failed to create CI with relationships",
            ActionKind::UpdateItem => "Failed to update CI",
            ActionKind::DeleteItem => "Failed to delete CI",
            ActionKind::FetchRelationships => "Failed to fetch relationships",
            ActionKind::FetchAllRelationships => "Failed to fetch all relationships",
            ActionKind::CreateRelationship => "Failed to create relationship",
            ActionKind::DeleteRelationship => "Failed to delete relationship",
            ActionKind::FetchImpactAnalysis => "Failed to fetch impact analysis",
            ActionKind::FetchDependencyAnalysis => "Failed to fetch dependency analysis",
            ActionKind::FetchBusFactorAnalysis => "Failed to fetch bus factor analysis",
            ActionKind::FetchGraphStats => "Failed to fetch graph stats",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ActionStatus {
    /// The API call has not returned yet.
    Pending,
    /// The call succeeded and its mutation was applied.
    Succeeded,
    /// The call failed with this message.
    Failed(String),
    /// The caller dropped the action before it settled. Nothing was applied.
    Cancelled,
}

impl ActionStatus {
    /// Returns true while the call is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, ActionStatus::Pending)
    }

    /// Returns the failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            ActionStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// One tracked invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: ActionId,
    pub kind: ActionKind,
    pub status: ActionStatus,
    pub started_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl ActionRecord {
    /// Time between start and settle, if settled.
    pub fn duration(&self) -> Option<Duration> {
        self.settled_at.map(|settled| settled - self.started_at)
    }
}

/// Outcome of an action together with the invocation that produced it.
#[derive(Debug)]
pub struct Tracked<T> {
    pub id: ActionId,
    pub result: Result<T, ClientError>,
}

impl<T> Tracked<T> {
    /// Drops the id and returns the result.
    pub fn into_result(self) -> Result<T, ClientError> {
        self.result
    }
}

/// Bounded history of action records.
///
/// Pending records are never evicted; once the history is over capacity the
/// oldest settled record is dropped.
#[derive(Debug, Clone)]
pub struct ActionLog {
    records: VecDeque<ActionRecord>,
    capacity: usize,
    next_id: u64,
}

impl ActionLog {
    /// Creates a log keeping at most `capacity` settled records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Registers a new pending invocation.
    pub fn start(&mut self, kind: ActionKind) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id += 1;
        self.records.push_back(ActionRecord {
            id,
            kind,
            status: ActionStatus::Pending,
            started_at: Utc::now(),
            settled_at: None,
        });
        self.evict();
        id
    }

    /// Records the outcome of a pending invocation.
    ///
    /// Returns false if the id is unknown or already settled.
    pub fn settle(&mut self, id: ActionId, status: ActionStatus) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) if record.status.is_pending() => {
                record.status = status;
                record.settled_at = Some(Utc::now());
                self.evict();
                true
            }
            _ => false,
        }
    }

    /// Looks up a record by id.
    pub fn get(&self, id: ActionId) -> Option<&ActionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Returns the most recently started invocation of `kind`.
    pub fn last_of(&self, kind: ActionKind) -> Option<&ActionRecord> {
        self.records.iter().rev().find(|r| r.kind == kind)
    }

    /// Returns true if any invocation is in flight.
    pub fn has_pending(&self) -> bool {
        self.records.iter().any(|r| r.status.is_pending())
    }

    /// Returns the in-flight invocations, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter().filter(|r| r.status.is_pending())
    }

    /// Returns all retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn evict(&mut self) {
        while self.records.len() > self.capacity {
            match self.records.iter().position(|r| !r.status.is_pending()) {
                Some(index) => {
                    self.records.remove(index);
                }
                None => break,
            }
        }
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTION_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_assigns_increasing_ids() {
        let mut log = ActionLog::default();
        let a = log.start(ActionKind::FetchItems);
        let b = log.start(ActionKind::FetchGraphStats);
        assert!(a < b);
        assert_eq!(log.len(), 2);
        assert!(log.has_pending());
    }

    #[test]
    fn test_settle_marks_outcome_once() {
        let mut log = ActionLog::default();
        let id = log.start(ActionKind::CreateItem);

        assert!(log.settle(id, ActionStatus::Failed("boom".into())));
        assert!(!log.settle(id, ActionStatus::Succeeded));

        let record = log.get(id).unwrap();
        assert_eq!(record.status.error(), Some("boom"));
        assert!(record.settled_at.is_some());
        assert!(record.duration().unwrap() >= Duration::zero());
        assert!(!log.has_pending());
    }

    #[test]
    fn test_pending_tracks_overlapping_invocations() {
        let mut log = ActionLog::default();
        let first = log.start(ActionKind::FetchItems);
        let second = log.start(ActionKind::FetchItems);

        log.settle(first, ActionStatus::Succeeded);
        assert!(log.has_pending());
        assert_eq!(log.pending().map(|r| r.id).collect::<Vec<_>>(), vec![second]);

        log.settle(second, ActionStatus::Succeeded);
        assert!(!log.has_pending());
    }

    #[test]
    fn test_eviction_keeps_pending_records() {
        let mut log = ActionLog::new(2);
        let held = log.start(ActionKind::FetchItems);
        for _ in 0..5 {
            let id = log.start(ActionKind::FetchGraphStats);
            log.settle(id, ActionStatus::Succeeded);
        }

        assert_eq!(log.len(), 2);
        assert!(log.get(held).unwrap().status.is_pending());
        assert_eq!(log.last_of(ActionKind::FetchGraphStats).unwrap().id.get(), 6);
    }

    #[test]
    fn test_fallback_messages() {
        assert_eq!(ActionKind::FetchItems.fallback_message(), "Failed to fetch CIs");
        assert_eq!(ActionKind::CreateItem.fallback_message(), "Failed to create CI");
        assert_eq!(
            ActionKind::FetchBusFactorAnalysis.fallback_message(),
            "Failed to fetch bus factor analysis"
        );
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(ActionStatus::Failed("nope".into())).unwrap();
        assert_eq!(json, serde_json::json!({"state": "failed", "message": "nope"}));
        let json = serde_json::to_value(ActionStatus::Cancelled).unwrap();
        assert_eq!(json, serde_json::json!({"state": "cancelled"}));
    }

    #[test]
    fn test_cancelled_records_are_evictable() {
        let mut log = ActionLog::new(1);
        let dropped = log.start(ActionKind::FetchItems);
        log.settle(dropped, ActionStatus::Cancelled);
        assert!(!log.has_pending());

        let next = log.start(ActionKind::FetchItems);
        assert_eq!(log.len(), 1);
        assert!(log.get(dropped).is_none());
        assert!(log.get(next).is_some());
    }
}
