//! Canonical registration events.

use chrono::{DateTime, Utc};
use rpc_register_core::{RegisterPayload, RpcType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of change a registration event applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    /// A service announced a path for the first time (or again).
    Register,
    /// A service changed an already registered path.
    Update,
    /// A service withdrew a path.
    Delete,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Register => f.write_str("REGISTER"),
            ChangeType::Update => f.write_str("UPDATE"),
            ChangeType::Delete => f.write_str("DELETE"),
        }
    }
}

/// One registration change travelling through the pipeline.
///
/// Fields are private: an event is immutable once built, and its dialect
/// tag is always the one carried by its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEvent {
    id: String,
    sequence: u64,
    change_type: ChangeType,
    payload: RegisterPayload,
    timestamp: DateTime<Utc>,
}

impl RegisterEvent {
    /// Creates a new event for a payload.
    pub fn new(change_type: ChangeType, payload: RegisterPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sequence: 0,
            change_type,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Unique identifier for this event instance.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Publish order assigned by the publisher (0 if never published).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The change this event applies.
    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    /// The dialect that produced the payload.
    pub fn rpc_type(&self) -> RpcType {
        self.payload.rpc_type()
    }

    /// The protocol-specific registration record.
    pub fn payload(&self) -> &RegisterPayload {
        &self.payload
    }

    /// When the event was created.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Key used to route the event to a consumer partition.
    pub fn partition_key(&self) -> String {
        self.payload.partition_key()
    }
}
