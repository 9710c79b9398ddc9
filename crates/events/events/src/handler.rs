//! Event handler trait.

use async_trait::async_trait;
use rpc_register_core::RegisterResult;

use crate::event::RegisterEvent;

/// Trait for consumers of registration events.
///
/// Handlers run on the publisher's worker tasks, one event at a time per
/// partition, in channel order.
#[async_trait]
pub trait RegisterEventHandler: Send + Sync {
    /// Returns a unique identifier for this handler.
    fn id(&self) -> &str {
        "anonymous"
    }

    /// Applies an event.
    async fn handle(&self, event: &RegisterEvent) -> RegisterResult<()>;
}
