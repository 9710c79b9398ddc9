//! # RPC Register Memory Adapter
//!
//! An in-memory storage adapter for service registration, primarily
//! intended for testing and development purposes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rpc_register_adapter_memory::MemoryAdapter;
//! use rpc_register_core::DefaultRegisterService;
//!
//! let adapter = Arc::new(MemoryAdapter::new());
//! let service = DefaultRegisterService::new(adapter.clone());
//! ```

use async_trait::async_trait;
use rpc_register_core::error::RegisterResult;
use rpc_register_core::traits::RegistryStorage;
use rpc_register_core::types::{MetaData, Rule, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage for a single entity type, keyed by id.
type Store<T> = Arc<RwLock<HashMap<String, T>>>;

/// In-memory storage adapter.
///
/// This adapter stores all data in memory and is suitable for
/// testing and development. Data is lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    metadata: Store<MetaData>,
    selectors: Store<Selector>,
    rules: Store<Rule>,
}

impl MemoryAdapter {
    /// Creates a new in-memory adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all stored data.
    pub async fn clear(&self) {
        self.metadata.write().await.clear();
        self.selectors.write().await.clear();
        self.rules.write().await.clear();
        tracing::debug!("Memory registry cleared");
    }

    /// Returns the number of metadata records stored.
    pub async fn metadata_count(&self) -> usize {
        self.metadata.read().await.len()
    }

    /// Returns the number of selectors stored.
    pub async fn selector_count(&self) -> usize {
        self.selectors.read().await.len()
    }

    /// Returns the number of rules stored.
    pub async fn rule_count(&self) -> usize {
        self.rules.read().await.len()
    }
}

#[async_trait]
impl RegistryStorage for MemoryAdapter {
    // ==================== Metadata Operations ====================

    async fn get_metadata_by_path(&self, path: &str) -> RegisterResult<Option<MetaData>> {
        let metadata = self.metadata.read().await;
        Ok(metadata.values().find(|m| m.path == path).cloned())
    }

    async fn save_metadata(&self, record: &MetaData) -> RegisterResult<MetaData> {
        let mut metadata = self.metadata.write().await;

        // Paths are unique: a record saved under a new id replaces the old one.
        metadata.retain(|id, m| m.path != record.path || *id == record.id);
        metadata.insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn delete_metadata_by_path(&self, path: &str) -> RegisterResult<bool> {
        let mut metadata = self.metadata.write().await;
        let before = metadata.len();
        metadata.retain(|_, m| m.path != path);
        Ok(metadata.len() != before)
    }

    // ==================== Selector Operations ====================

    async fn find_selector(&self, plugin_name: &str, name: &str) -> RegisterResult<Option<Selector>> {
        let selectors = self.selectors.read().await;
        Ok(selectors
            .values()
            .find(|s| s.plugin_name == plugin_name && s.name == name)
            .cloned())
    }

    async fn save_selector(&self, selector: &Selector) -> RegisterResult<Selector> {
        let mut selectors = self.selectors.write().await;
        selectors.insert(selector.id.clone(), selector.clone());
        Ok(selector.clone())
    }

    // ==================== Rule Operations ====================

    async fn find_rule(&self, selector_id: &str, name: &str) -> RegisterResult<Option<Rule>> {
        let rules = self.rules.read().await;
        Ok(rules
            .values()
            .find(|r| r.selector_id == selector_id && r.name == name)
            .cloned())
    }

    async fn save_rule(&self, rule: &Rule) -> RegisterResult<Rule> {
        let mut rules = self.rules.write().await;
        rules.insert(rule.id.clone(), rule.clone());
        Ok(rule.clone())
    }

    async fn delete_rule(&self, id: &str) -> RegisterResult<()> {
        let mut rules = self.rules.write().await;
        rules.remove(id);
        Ok(())
    }
}
