//! Protocol normalizers.
//!
//! Each dialect posts its own registration shape. A [`Normalizer`] validates
//! that shape and maps it into a [`RegisterPayload`], filling defaults the
//! persistence layer relies on. Normalizers are pure and stateless.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{RegisterError, RegisterResult};
use crate::types::{
    MetaDataRegister, RegisterPayload, RpcType, SpringCloudRegister, SpringMvcRegister,
};

/// Maps a dialect-specific registration request into a canonical payload.
pub trait Normalizer: Send + Sync + 'static {
    /// The request body accepted for this dialect.
    type Request: DeserializeOwned + Send + 'static;

    /// The dialect this normalizer produces payloads for.
    const RPC_TYPE: RpcType;

    /// Validates the request and builds the payload.
    fn normalize(request: Self::Request) -> RegisterResult<RegisterPayload>;
}

// ==================== Request Bodies ====================

/// Registration body posted by HTTP services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringMvcRegisterRequest {
    pub app_name: Option<String>,
    #[serde(alias = "context")]
    pub context_path: Option<String>,
    pub path: Option<String>,
    pub path_desc: Option<String>,
    pub rpc_type: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub rule_name: Option<String>,
    pub enabled: Option<bool>,
    pub register_meta_data: Option<bool>,
}

/// Registration body posted by cloud-discovery services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringCloudRegisterRequest {
    pub app_name: Option<String>,
    #[serde(alias = "context")]
    pub context_path: Option<String>,
    pub path: Option<String>,
    pub path_desc: Option<String>,
    pub rpc_type: Option<String>,
    pub rule_name: Option<String>,
    pub enabled: Option<bool>,
}

/// Registration body posted by binary RPC services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataRegisterRequest {
    pub app_name: Option<String>,
    #[serde(alias = "context")]
    pub context_path: Option<String>,
    pub path: Option<String>,
    pub path_desc: Option<String>,
    pub rpc_type: Option<String>,
    pub service_name: Option<String>,
    pub method_name: Option<String>,
    pub rule_name: Option<String>,
    pub parameter_types: Option<String>,
    pub rpc_ext: Option<String>,
    pub enabled: Option<bool>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

// ==================== Normalizers ====================

/// Normalizer for HTTP registrations.
pub struct SpringMvcNormalizer;

impl Normalizer for SpringMvcNormalizer {
    type Request = SpringMvcRegisterRequest;
    const RPC_TYPE: RpcType = RpcType::Http;

    fn normalize(request: Self::Request) -> RegisterResult<RegisterPayload> {
        check_tag(Self::RPC_TYPE, request.rpc_type.as_deref())?;
        let app_name = required("app_name", request.app_name)?;
        let path = required_path("path", request.path)?;
        let host = required("host", request.host)?;
        let port = required_port(request.port)?;
        let context_path = context_or_default(request.context_path, &app_name)?;

        Ok(RegisterPayload::SpringMvc(SpringMvcRegister {
            rule_name: optional(request.rule_name).unwrap_or_else(|| path.clone()),
            path_desc: optional(request.path_desc).unwrap_or_default(),
            enabled: request.enabled.unwrap_or(true),
            register_meta_data: request.register_meta_data.unwrap_or(false),
            app_name,
            context_path,
            path,
            host,
            port,
        }))
    }
}

/// Normalizer for cloud-discovery registrations.
pub struct SpringCloudNormalizer;

impl Normalizer for SpringCloudNormalizer {
    type Request = SpringCloudRegisterRequest;
    const RPC_TYPE: RpcType = RpcType::SpringCloud;

    fn normalize(request: Self::Request) -> RegisterResult<RegisterPayload> {
        check_tag(Self::RPC_TYPE, request.rpc_type.as_deref())?;
        let app_name = required("app_name", request.app_name)?;
        let path = required_path("path", request.path)?;
        let context_path = context_or_default(request.context_path, &app_name)?;

        Ok(RegisterPayload::SpringCloud(SpringCloudRegister {
            rule_name: optional(request.rule_name).unwrap_or_else(|| path.clone()),
            path_desc: optional(request.path_desc).unwrap_or_default(),
            enabled: request.enabled.unwrap_or(true),
            app_name,
            context_path,
            path,
        }))
    }
}

/// Normalizer for Dubbo registrations.
pub struct DubboNormalizer;

impl Normalizer for DubboNormalizer {
    type Request = MetaDataRegisterRequest;
    const RPC_TYPE: RpcType = RpcType::Dubbo;

    fn normalize(request: Self::Request) -> RegisterResult<RegisterPayload> {
        normalize_metadata(Self::RPC_TYPE, request)
    }
}

/// Normalizer for SOFA RPC registrations.
pub struct SofaNormalizer;

impl Normalizer for SofaNormalizer {
    type Request = MetaDataRegisterRequest;
    const RPC_TYPE: RpcType = RpcType::Sofa;

    fn normalize(request: Self::Request) -> RegisterResult<RegisterPayload> {
        normalize_metadata(Self::RPC_TYPE, request)
    }
}

/// Normalizer for Tars registrations.
pub struct TarsNormalizer;

impl Normalizer for TarsNormalizer {
    type Request = MetaDataRegisterRequest;
    const RPC_TYPE: RpcType = RpcType::Tars;

    fn normalize(request: Self::Request) -> RegisterResult<RegisterPayload> {
        normalize_metadata(Self::RPC_TYPE, request)
    }
}

/// Normalizer for gRPC registrations.
pub struct GrpcNormalizer;

impl Normalizer for GrpcNormalizer {
    type Request = MetaDataRegisterRequest;
    const RPC_TYPE: RpcType = RpcType::Grpc;

    fn normalize(request: Self::Request) -> RegisterResult<RegisterPayload> {
        normalize_metadata(Self::RPC_TYPE, request)
    }
}

fn normalize_metadata(rpc_type: RpcType, request: MetaDataRegisterRequest) -> RegisterResult<RegisterPayload> {
    check_tag(rpc_type, request.rpc_type.as_deref())?;
    let app_name = required("app_name", request.app_name)?;
    let path = required_path("path", request.path)?;
    let service_name = required("service_name", request.service_name)?;
    let method_name = required("method_name", request.method_name)?;
    let context_path = context_or_default(request.context_path, &app_name)?;

    // Tars and gRPC selectors route straight to the registering instance.
    let (host, port) = if rpc_type.has_upstream() {
        (
            Some(required("host", request.host)?),
            Some(required_port(request.port)?),
        )
    } else {
        (optional(request.host), request.port)
    };

    Ok(RegisterPayload::MetaData(MetaDataRegister {
        rule_name: optional(request.rule_name).unwrap_or_else(|| path.clone()),
        path_desc: optional(request.path_desc).unwrap_or_default(),
        parameter_types: optional(request.parameter_types),
        rpc_ext: optional(request.rpc_ext),
        enabled: request.enabled.unwrap_or(true),
        rpc_type,
        app_name,
        context_path,
        path,
        service_name,
        method_name,
        host,
        port,
    }))
}

// ==================== Field Helpers ====================

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(field: &str, value: Option<String>) -> RegisterResult<String> {
    optional(value).ok_or_else(|| RegisterError::missing(field))
}

fn required_path(field: &str, value: Option<String>) -> RegisterResult<String> {
    let path = required(field, value)?;
    if !path.starts_with('/') {
        return Err(RegisterError::invalid(field, "must start with '/'"));
    }
    Ok(path)
}

fn required_port(port: Option<u16>) -> RegisterResult<u16> {
    match port {
        None => Err(RegisterError::missing("port")),
        Some(0) => Err(RegisterError::invalid("port", "must be non-zero")),
        Some(p) => Ok(p),
    }
}

fn context_or_default(context_path: Option<String>, app_name: &str) -> RegisterResult<String> {
    match optional(context_path) {
        None => Ok(format!("/{}", app_name)),
        Some(ctx) if ctx.starts_with('/') => Ok(ctx),
        Some(_) => Err(RegisterError::invalid("context_path", "must start with '/'")),
    }
}

fn check_tag(expected: RpcType, supplied: Option<&str>) -> RegisterResult<()> {
    let Some(name) = supplied.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    match RpcType::from_name(name) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(RegisterError::RpcTypeMismatch { expected, actual }),
        None => Err(RegisterError::invalid("rpc_type", format!("unknown rpc type '{}'", name))),
    }
}
