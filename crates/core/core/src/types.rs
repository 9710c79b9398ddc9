//! Core data types for service registration.
//!
//! This module defines the protocol tags, the canonical registration records
//! produced by the normalizers, and the persisted routing entities
//! (`MetaData`, `Selector`, `Rule`) consumed by the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::RegisterResult;

/// The RPC dialect a service registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcType {
    /// Plain HTTP (Spring MVC style) services.
    Http,
    /// Services resolved through a cloud discovery registry.
    SpringCloud,
    /// Apache Dubbo services.
    Dubbo,
    /// SOFA RPC services.
    Sofa,
    /// Tars services.
    Tars,
    /// gRPC services.
    Grpc,
}

impl RpcType {
    /// All supported dialects.
    pub const ALL: [RpcType; 6] = [
        RpcType::Http,
        RpcType::SpringCloud,
        RpcType::Dubbo,
        RpcType::Sofa,
        RpcType::Tars,
        RpcType::Grpc,
    ];

    /// Returns the wire name of this dialect.
    pub fn name(&self) -> &'static str {
        match self {
            RpcType::Http => "http",
            RpcType::SpringCloud => "springCloud",
            RpcType::Dubbo => "dubbo",
            RpcType::Sofa => "sofa",
            RpcType::Tars => "tars",
            RpcType::Grpc => "grpc",
        }
    }

    /// Parses a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Returns the gateway plugin that owns selectors for this dialect.
    pub fn plugin_name(&self) -> &'static str {
        match self {
            RpcType::Http => "divide",
            other => other.name(),
        }
    }

    /// Whether registrations of this dialect carry an upstream address.
    pub fn has_upstream(&self) -> bool {
        matches!(self, RpcType::Http | RpcType::Tars | RpcType::Grpc)
    }
}

impl fmt::Display for RpcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ==================== Canonical Registration Records ====================

/// A normalized HTTP service registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringMvcRegister {
    pub app_name: String,
    pub context_path: String,
    pub path: String,
    pub path_desc: String,
    pub host: String,
    pub port: u16,
    pub rule_name: String,
    pub enabled: bool,
    /// Whether a metadata record should be stored alongside the rule.
    pub register_meta_data: bool,
}

impl SpringMvcRegister {
    /// Returns the `host:port` upstream address.
    pub fn upstream_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A normalized cloud-discovery service registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringCloudRegister {
    pub app_name: String,
    pub context_path: String,
    pub path: String,
    pub path_desc: String,
    pub rule_name: String,
    pub enabled: bool,
}

/// A normalized binary RPC registration (Dubbo, Sofa, Tars, gRPC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataRegister {
    pub app_name: String,
    pub context_path: String,
    pub path: String,
    pub path_desc: String,
    pub rpc_type: RpcType,
    pub service_name: String,
    pub method_name: String,
    pub rule_name: String,
    pub parameter_types: Option<String>,
    pub rpc_ext: Option<String>,
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl MetaDataRegister {
    /// Returns the `host:port` upstream address when both parts are known.
    pub fn upstream_url(&self) -> Option<String> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(format!("{}:{}", host, port)),
            _ => None,
        }
    }
}

/// A protocol-specific registration record, as produced by a normalizer.
///
/// The dialect tag is derived from the variant (and, for binary RPC records,
/// from the tag the normalizer stamped), so a payload can never be paired
/// with a foreign tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RegisterPayload {
    SpringMvc(SpringMvcRegister),
    SpringCloud(SpringCloudRegister),
    MetaData(MetaDataRegister),
}

impl RegisterPayload {
    /// Returns the dialect this payload belongs to.
    pub fn rpc_type(&self) -> RpcType {
        match self {
            RegisterPayload::SpringMvc(_) => RpcType::Http,
            RegisterPayload::SpringCloud(_) => RpcType::SpringCloud,
            RegisterPayload::MetaData(m) => m.rpc_type,
        }
    }

    /// Returns the registering application.
    pub fn app_name(&self) -> &str {
        match self {
            RegisterPayload::SpringMvc(r) => &r.app_name,
            RegisterPayload::SpringCloud(r) => &r.app_name,
            RegisterPayload::MetaData(r) => &r.app_name,
        }
    }

    /// Returns the exposed path.
    pub fn path(&self) -> &str {
        match self {
            RegisterPayload::SpringMvc(r) => &r.path,
            RegisterPayload::SpringCloud(r) => &r.path,
            RegisterPayload::MetaData(r) => &r.path,
        }
    }

    /// Returns the context path the selector is keyed on.
    pub fn context_path(&self) -> &str {
        match self {
            RegisterPayload::SpringMvc(r) => &r.context_path,
            RegisterPayload::SpringCloud(r) => &r.context_path,
            RegisterPayload::MetaData(r) => &r.context_path,
        }
    }

    /// Returns the rule name.
    pub fn rule_name(&self) -> &str {
        match self {
            RegisterPayload::SpringMvc(r) => &r.rule_name,
            RegisterPayload::SpringCloud(r) => &r.rule_name,
            RegisterPayload::MetaData(r) => &r.rule_name,
        }
    }

    /// Returns the key that orders events: the selector this payload writes
    /// to, as `plugin:context_path`.
    ///
    /// Every path of one application context shares a selector, so they must
    /// share a partition for the selector upsert to stay serialized.
    pub fn partition_key(&self) -> String {
        format!("{}:{}", self.rpc_type().plugin_name(), self.context_path())
    }
}

// ==================== Persisted Entities ====================

/// Service metadata the gateway uses to invoke RPC backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub id: String,
    pub app_name: String,
    pub context_path: String,
    pub path: String,
    pub path_desc: String,
    pub rpc_type: RpcType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_ext: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MetaData {
    /// Creates a metadata record for a path with a fresh id.
    pub fn new(app_name: impl Into<String>, path: impl Into<String>, rpc_type: RpcType) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            app_name: app_name.into(),
            context_path: String::new(),
            path: path.into(),
            path_desc: String::new(),
            rpc_type,
            service_name: None,
            method_name: None,
            parameter_types: None,
            rpc_ext: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A match condition on a selector or rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub param_type: String,
    pub operator: String,
    pub param_name: String,
    pub param_value: String,
}

impl Condition {
    /// A URI condition. Paths containing `*` use the `match` operator.
    pub fn uri(path: impl Into<String>) -> Self {
        let path = path.into();
        let operator = if path.contains('*') { "match" } else { "=" };
        Self {
            param_type: "uri".to_string(),
            operator: operator.to_string(),
            param_name: "/".to_string(),
            param_value: path,
        }
    }
}

/// One upstream address in a selector handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub upstream_url: String,
    pub weight: u32,
    pub status: bool,
}

impl Upstream {
    /// Creates an enabled upstream with the default weight.
    pub fn new(upstream_url: impl Into<String>) -> Self {
        Self {
            upstream_url: upstream_url.into(),
            weight: 50,
            status: true,
        }
    }
}

/// A selector groups the rules of one application under one plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    pub id: String,
    pub plugin_name: String,
    /// Selectors are keyed by the registering context path.
    pub name: String,
    pub conditions: Vec<Condition>,
    /// Plugin-specific handle (upstream list, service id, ...).
    pub handle: Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Selector {
    /// Creates a selector matching everything under `context_path`.
    pub fn new(plugin_name: impl Into<String>, context_path: impl Into<String>) -> Self {
        let name = context_path.into();
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            plugin_name: plugin_name.into(),
            conditions: vec![Condition::uri(format!("{}/**", name))],
            name,
            handle: Value::Null,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the upstream list stored in the handle, or an empty list.
    pub fn upstreams(&self) -> Vec<Upstream> {
        serde_json::from_value(self.handle.clone()).unwrap_or_default()
    }

    /// Replaces the upstream list in the handle.
    pub fn set_upstreams(&mut self, upstreams: &[Upstream]) -> RegisterResult<()> {
        self.handle = serde_json::to_value(upstreams)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// A rule routes one path inside a selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub selector_id: String,
    pub name: String,
    pub conditions: Vec<Condition>,
    pub handle: Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// Creates a rule for `path` inside the given selector.
    pub fn new(selector_id: impl Into<String>, name: impl Into<String>, path: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            selector_id: selector_id.into(),
            name: name.into(),
            conditions: vec![Condition::uri(path)],
            handle: Value::Null,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_type_names() {
        for t in RpcType::ALL {
            assert_eq!(RpcType::from_name(t.name()), Some(t));
        }
        assert_eq!(RpcType::from_name("thrift"), None);
        assert_eq!(RpcType::Http.plugin_name(), "divide");
        assert_eq!(RpcType::Grpc.plugin_name(), "grpc");
        assert_eq!(
            serde_json::to_value(RpcType::SpringCloud).unwrap(),
            serde_json::json!("springCloud")
        );
    }

    #[test]
    fn test_condition_operator() {
        assert_eq!(Condition::uri("/order/list").operator, "=");
        assert_eq!(Condition::uri("/order/**").operator, "match");
    }

    #[test]
    fn test_selector_upstreams() {
        let mut selector = Selector::new("divide", "/order");
        assert!(selector.upstreams().is_empty());
        assert_eq!(selector.conditions[0].param_value, "/order/**");

        selector.set_upstreams(&[Upstream::new("10.0.0.1:8080")]).unwrap();
        assert!(selector.handle.is_array());
        let upstreams = selector.upstreams();
        assert_eq!(upstreams.len(), 1);
        assert_eq!(upstreams[0].upstream_url, "10.0.0.1:8080");
        assert_eq!(upstreams[0].weight, 50);
    }

    #[test]
    fn test_payload_tag() {
        let payload = RegisterPayload::SpringCloud(SpringCloudRegister {
            app_name: "order-service".into(),
            context_path: "/order".into(),
            path: "/order/list".into(),
            path_desc: String::new(),
            rule_name: "/order/list".into(),
            enabled: true,
        });
        assert_eq!(payload.rpc_type(), RpcType::SpringCloud);
        assert_eq!(payload.partition_key(), "springCloud:/order");
    }
}
