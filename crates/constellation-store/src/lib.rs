//! Client state store for the Constellation CMDB.
//!
//! [`CmdbStore`] mirrors a subset of server state (items, the selected item,
//! relationships, analysis snapshots) and funnels every change through
//! async actions that share one loading/error contract. Each invocation is
//! tracked by [`ActionId`] so overlapping actions do not clobber each other's
//! loading state.

pub mod action;
mod state;
pub mod store;

pub use action::{
    ActionId, ActionKind, ActionLog, ActionRecord, ActionStatus, Tracked,
    DEFAULT_ACTION_HISTORY,
};
pub use state::{with_criticality, StoreSnapshot};
pub use store::{CmdbStore, DEFAULT_RELATIONSHIP_LIMIT};
