//! Core traits for service registration.
//!
//! This module defines the persistence collaborators the registration
//! pipeline writes through: the low-level [`RegistryStorage`] adapter and
//! the [`RegisterService`] that turns one registration into stored
//! metadata, selector and rule rows.

use async_trait::async_trait;

use crate::error::RegisterResult;
use crate::types::{
    MetaData, MetaDataRegister, RegisterPayload, Rule, Selector, SpringCloudRegister,
    SpringMvcRegister,
};

/// Trait for storage adapters.
///
/// Adapters persist the routing entities the gateway reads. All `save_*`
/// operations are create-or-update keyed by the entity id.
#[async_trait]
pub trait RegistryStorage: Send + Sync {
    // ==================== Metadata Operations ====================

    /// Gets the metadata record registered for a path.
    async fn get_metadata_by_path(&self, path: &str) -> RegisterResult<Option<MetaData>>;

    /// Creates or updates a metadata record.
    async fn save_metadata(&self, metadata: &MetaData) -> RegisterResult<MetaData>;

    /// Deletes the metadata record for a path. Returns whether one existed.
    async fn delete_metadata_by_path(&self, path: &str) -> RegisterResult<bool>;

    // ==================== Selector Operations ====================

    /// Looks up a selector by plugin and name.
    async fn find_selector(&self, plugin_name: &str, name: &str) -> RegisterResult<Option<Selector>>;

    /// Creates or updates a selector.
    async fn save_selector(&self, selector: &Selector) -> RegisterResult<Selector>;

    // ==================== Rule Operations ====================

    /// Looks up a rule by selector and name.
    async fn find_rule(&self, selector_id: &str, name: &str) -> RegisterResult<Option<Rule>>;

    /// Creates or updates a rule.
    async fn save_rule(&self, rule: &Rule) -> RegisterResult<Rule>;

    /// Deletes a rule by id.
    async fn delete_rule(&self, id: &str) -> RegisterResult<()>;
}

/// Applies registrations to persisted routing state, one method per dialect.
#[async_trait]
pub trait RegisterService: Send + Sync {
    /// Registers an HTTP service path.
    async fn register_spring_mvc(&self, record: &SpringMvcRegister) -> RegisterResult<()>;

    /// Registers a cloud-discovery service path.
    async fn register_spring_cloud(&self, record: &SpringCloudRegister) -> RegisterResult<()>;

    /// Registers a Dubbo method.
    async fn register_dubbo(&self, record: &MetaDataRegister) -> RegisterResult<()>;

    /// Registers a SOFA RPC method.
    async fn register_sofa(&self, record: &MetaDataRegister) -> RegisterResult<()>;

    /// Registers a Tars method.
    async fn register_tars(&self, record: &MetaDataRegister) -> RegisterResult<()>;

    /// Registers a gRPC method.
    async fn register_grpc(&self, record: &MetaDataRegister) -> RegisterResult<()>;

    /// Removes whatever a previous registration of this payload stored.
    async fn unregister(&self, payload: &RegisterPayload) -> RegisterResult<()>;
}
