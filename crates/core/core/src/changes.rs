//! Routing-data change notifications.
//!
//! Every write the registration service makes to metadata, selectors or
//! rules is announced on a [`DataChangeBus`], so gateway-side caches can
//! follow the registry without polling storage.
//!
//! The bus is a thin wrapper over [`tokio::sync::broadcast`]:
//! - publishing never blocks and succeeds with no subscribers;
//! - a receiver only sees changes sent after it subscribed;
//! - slow receivers observe `RecvError::Lagged(n)` and skip the oldest `n`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

use crate::types::{MetaData, Rule, Selector};

/// Default ring buffer size of a change bus.
pub const DEFAULT_CHANGE_CAPACITY: usize = 1024;

/// What happened to a routing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for DataAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataAction::Create => "CREATE",
            DataAction::Update => "UPDATE",
            DataAction::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// The kind of routing record that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataKind {
    MetaData,
    Selector,
    Rule,
}

/// The record as it was written (or, for deletes, as it was last stored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum ChangedData {
    MetaData(MetaData),
    Selector(Selector),
    Rule(Rule),
}

/// One routing-data change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChanged {
    pub action: DataAction,
    pub record: ChangedData,
}

impl DataChanged {
    pub fn new(action: DataAction, record: ChangedData) -> Self {
        Self { action, record }
    }

    /// Returns the kind of record that changed.
    pub fn kind(&self) -> DataKind {
        match &self.record {
            ChangedData::MetaData(_) => DataKind::MetaData,
            ChangedData::Selector(_) => DataKind::Selector,
            ChangedData::Rule(_) => DataKind::Rule,
        }
    }

    /// Returns the id of the record that changed.
    pub fn id(&self) -> &str {
        match &self.record {
            ChangedData::MetaData(m) => &m.id,
            ChangedData::Selector(s) => &s.id,
            ChangedData::Rule(r) => &r.id,
        }
    }
}

/// Broadcast channel for routing-data changes.
///
/// Cheap to clone; clones share the same channel.
#[derive(Debug, Clone)]
pub struct DataChangeBus {
    tx: broadcast::Sender<DataChanged>,
}

impl DataChangeBus {
    /// Creates a bus that keeps up to `capacity` undelivered changes.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Announces a change to all current subscribers.
    pub fn publish(&self, change: DataChanged) {
        tracing::trace!(
            kind = ?change.kind(),
            action = %change.action,
            id = %change.id(),
            "Routing data changed"
        );
        let _ = self.tx.send(change);
    }

    /// Creates a receiver for changes published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DataChanged> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for DataChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_CAPACITY)
    }
}
