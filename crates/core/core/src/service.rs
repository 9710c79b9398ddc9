//! Default registration service.
//!
//! Turns a canonical registration into routing state: one selector per
//! (plugin, context path), one rule per registered path, and a metadata
//! record for binary RPC methods. Every step is create-or-update, so
//! re-registering the same service is harmless.
//!
//! Writes that touch one selector are serialized per `(plugin, context path)`,
//! and every stored change is announced on the service's [`DataChangeBus`].

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};

use crate::changes::{ChangedData, DataAction, DataChangeBus, DataChanged};
use crate::error::RegisterResult;
use crate::traits::{RegisterService, RegistryStorage};
use crate::types::{
    MetaData, MetaDataRegister, RegisterPayload, RpcType, Rule, Selector, SpringCloudRegister,
    SpringMvcRegister, Upstream,
};

/// Default rule timeout in milliseconds.
pub const DEFAULT_RULE_TIMEOUT_MS: u64 = 3000;

/// [`RegisterService`] backed by a [`RegistryStorage`] adapter.
pub struct DefaultRegisterService<S: RegistryStorage> {
    storage: Arc<S>,
    changes: DataChangeBus,
    selector_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: RegistryStorage> DefaultRegisterService<S> {
    /// Creates a new service writing through `storage`.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_changes(storage, DataChangeBus::default())
    }

    /// Creates a new service announcing its writes on `changes`.
    pub fn with_changes(storage: Arc<S>, changes: DataChangeBus) -> Self {
        Self {
            storage,
            changes,
            selector_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying storage adapter.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the bus routing-data changes are announced on.
    pub fn changes(&self) -> &DataChangeBus {
        &self.changes
    }

    /// Subscribes to routing-data changes.
    pub fn subscribe(&self) -> broadcast::Receiver<DataChanged> {
        self.changes.subscribe()
    }

    fn notify(&self, action: DataAction, record: ChangedData) {
        self.changes.publish(DataChanged::new(action, record));
    }

    /// Serializes writers of one selector. Two registrations for the same
    /// context must not both observe "no selector" and create one each.
    async fn lock_selector(&self, rpc_type: RpcType, context_path: &str) -> OwnedMutexGuard<()> {
        let key = format!("{}:{}", rpc_type.plugin_name(), context_path);
        let lock = {
            let mut locks = self.selector_locks.lock().await;
            Arc::clone(locks.entry(key).or_default())
        };
        lock.lock_owned().await
    }

    /// Finds the selector for a context path, creating it when absent.
    ///
    /// An upstream not yet listed in an existing selector is appended.
    async fn ensure_selector(
        &self,
        rpc_type: RpcType,
        context_path: &str,
        upstream: Option<String>,
        handle: Option<Value>,
    ) -> RegisterResult<Selector> {
        let plugin_name = rpc_type.plugin_name();

        let Some(mut selector) = self.storage.find_selector(plugin_name, context_path).await? else {
            let mut selector = Selector::new(plugin_name, context_path);
            if let Some(url) = upstream {
                selector.set_upstreams(&[Upstream::new(url)])?;
            } else if let Some(handle) = handle {
                selector.handle = handle;
            }
            let selector = self.storage.save_selector(&selector).await?;
            self.notify(DataAction::Create, ChangedData::Selector(selector.clone()));
            tracing::info!(
                plugin = plugin_name,
                selector = %selector.name,
                selector_id = %selector.id,
                "Created selector"
            );
            return Ok(selector);
        };

        if let Some(url) = upstream {
            let mut upstreams = selector.upstreams();
            if !upstreams.iter().any(|u| u.upstream_url == url) {
                upstreams.push(Upstream::new(url.clone()));
                selector.set_upstreams(&upstreams)?;
                selector = self.storage.save_selector(&selector).await?;
                self.notify(DataAction::Update, ChangedData::Selector(selector.clone()));
                tracing::info!(
                    plugin = plugin_name,
                    selector = %selector.name,
                    upstream = %url,
                    "Added upstream to selector"
                );
            }
        } else if let Some(handle) = handle {
            if selector.handle != handle {
                selector.handle = handle;
                selector.updated_at = Utc::now();
                selector = self.storage.save_selector(&selector).await?;
                self.notify(DataAction::Update, ChangedData::Selector(selector.clone()));
            }
        }

        Ok(selector)
    }

    /// Finds the rule for a path inside a selector, creating it when absent.
    async fn ensure_rule(
        &self,
        selector: &Selector,
        rule_name: &str,
        path: &str,
        handle: Value,
    ) -> RegisterResult<Rule> {
        if let Some(rule) = self.storage.find_rule(&selector.id, rule_name).await? {
            return Ok(rule);
        }

        let mut rule = Rule::new(&selector.id, rule_name, path);
        rule.handle = handle;
        let rule = self.storage.save_rule(&rule).await?;
        tracing::debug!(selector_id = %selector.id, rule = %rule.name, "Created rule");
        self.notify(DataAction::Create, ChangedData::Rule(rule.clone()));
        Ok(rule)
    }

    /// Creates or updates the metadata record keyed by `path`.
    async fn save_metadata(&self, mut metadata: MetaData) -> RegisterResult<MetaData> {
        let action = match self.storage.get_metadata_by_path(&metadata.path).await? {
            Some(existing) => {
                metadata.id = existing.id;
                metadata.created_at = existing.created_at;
                DataAction::Update
            }
            None => DataAction::Create,
        };
        metadata.updated_at = Utc::now();
        let metadata = self.storage.save_metadata(&metadata).await?;
        self.notify(action, ChangedData::MetaData(metadata.clone()));
        Ok(metadata)
    }

    async fn register_rpc(&self, record: &MetaDataRegister) -> RegisterResult<()> {
        let _guard = self.lock_selector(record.rpc_type, &record.context_path).await;

        let mut metadata = MetaData::new(&record.app_name, &record.path, record.rpc_type);
        metadata.context_path = record.context_path.clone();
        metadata.path_desc = record.path_desc.clone();
        metadata.service_name = Some(record.service_name.clone());
        metadata.method_name = Some(record.method_name.clone());
        metadata.parameter_types = record.parameter_types.clone();
        metadata.rpc_ext = record.rpc_ext.clone();
        metadata.enabled = record.enabled;
        self.save_metadata(metadata).await?;

        let upstream = if record.rpc_type.has_upstream() {
            record.upstream_url()
        } else {
            None
        };
        let selector = self
            .ensure_selector(record.rpc_type, &record.context_path, upstream, None)
            .await?;
        self.ensure_rule(
            &selector,
            &record.rule_name,
            &record.path,
            rule_handle(record.rpc_type, &record.path),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl<S: RegistryStorage> RegisterService for DefaultRegisterService<S> {
    async fn register_spring_mvc(&self, record: &SpringMvcRegister) -> RegisterResult<()> {
        let _guard = self.lock_selector(RpcType::Http, &record.context_path).await;

        if record.register_meta_data
            && self.storage.get_metadata_by_path(&record.path).await?.is_none()
        {
            let mut metadata = MetaData::new(&record.app_name, &record.path, RpcType::Http);
            metadata.context_path = record.context_path.clone();
            metadata.path_desc = record.path_desc.clone();
            metadata.enabled = record.enabled;
            let metadata = self.storage.save_metadata(&metadata).await?;
            self.notify(DataAction::Create, ChangedData::MetaData(metadata));
        }

        let selector = self
            .ensure_selector(
                RpcType::Http,
                &record.context_path,
                Some(record.upstream_url()),
                None,
            )
            .await?;
        self.ensure_rule(
            &selector,
            &record.rule_name,
            &record.path,
            rule_handle(RpcType::Http, &record.path),
        )
        .await?;
        Ok(())
    }

    async fn register_spring_cloud(&self, record: &SpringCloudRegister) -> RegisterResult<()> {
        let _guard = self.lock_selector(RpcType::SpringCloud, &record.context_path).await;

        let selector = self
            .ensure_selector(
                RpcType::SpringCloud,
                &record.context_path,
                None,
                Some(json!({ "serviceId": record.app_name })),
            )
            .await?;
        self.ensure_rule(
            &selector,
            &record.rule_name,
            &record.path,
            rule_handle(RpcType::SpringCloud, &record.path),
        )
        .await?;
        Ok(())
    }

    async fn register_dubbo(&self, record: &MetaDataRegister) -> RegisterResult<()> {
        self.register_rpc(record).await
    }

    async fn register_sofa(&self, record: &MetaDataRegister) -> RegisterResult<()> {
        self.register_rpc(record).await
    }

    async fn register_tars(&self, record: &MetaDataRegister) -> RegisterResult<()> {
        self.register_rpc(record).await
    }

    async fn register_grpc(&self, record: &MetaDataRegister) -> RegisterResult<()> {
        self.register_rpc(record).await
    }

    async fn unregister(&self, payload: &RegisterPayload) -> RegisterResult<()> {
        let _guard = self.lock_selector(payload.rpc_type(), payload.context_path()).await;

        if let Some(metadata) = self.storage.get_metadata_by_path(payload.path()).await? {
            if self.storage.delete_metadata_by_path(payload.path()).await? {
                self.notify(DataAction::Delete, ChangedData::MetaData(metadata));
            }
        }

        let plugin_name = payload.rpc_type().plugin_name();
        let Some(mut selector) = self
            .storage
            .find_selector(plugin_name, payload.context_path())
            .await?
        else {
            return Ok(());
        };

        if let Some(rule) = self.storage.find_rule(&selector.id, payload.rule_name()).await? {
            self.storage.delete_rule(&rule.id).await?;
            tracing::info!(
                plugin = plugin_name,
                selector = %selector.name,
                rule = %rule.name,
                "Removed rule"
            );
            self.notify(DataAction::Delete, ChangedData::Rule(rule));
        }

        let upstream = match payload {
            RegisterPayload::SpringMvc(record) => Some(record.upstream_url()),
            RegisterPayload::MetaData(record) if record.rpc_type.has_upstream() => record.upstream_url(),
            _ => None,
        };
        if let Some(url) = upstream {
            let mut upstreams = selector.upstreams();
            let before = upstreams.len();
            upstreams.retain(|u| u.upstream_url != url);
            if upstreams.len() != before {
                selector.set_upstreams(&upstreams)?;
                let selector = self.storage.save_selector(&selector).await?;
                tracing::info!(
                    plugin = plugin_name,
                    selector = %selector.name,
                    upstream = %url,
                    "Removed upstream from selector"
                );
                self.notify(DataAction::Update, ChangedData::Selector(selector));
            }
        }
        Ok(())
    }
}

/// Builds the plugin-specific rule handle for a path.
fn rule_handle(rpc_type: RpcType, path: &str) -> Value {
    match rpc_type {
        RpcType::Http => json!({
            "loadBalance": "random",
            "retry": 0,
            "timeout": DEFAULT_RULE_TIMEOUT_MS,
        }),
        RpcType::SpringCloud => json!({
            "path": path,
            "timeout": DEFAULT_RULE_TIMEOUT_MS,
        }),
        RpcType::Dubbo | RpcType::Sofa | RpcType::Tars | RpcType::Grpc => json!({
            "loadBalance": "random",
            "retries": 0,
            "timeout": DEFAULT_RULE_TIMEOUT_MS,
        }),
    }
}
