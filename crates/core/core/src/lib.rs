//! # RPC Register Core
//!
//! This crate provides the foundational types and traits for service
//! self-registration. It defines the protocol tags and canonical records,
//! the error taxonomy, the per-dialect normalizers, and the persistence
//! interfaces that storage adapters and the registration service implement.

pub mod changes;
pub mod error;
pub mod normalize;
pub mod service;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate root
pub use changes::{ChangedData, DataAction, DataChangeBus, DataChanged, DataKind};
pub use error::{RegisterError, RegisterResult};
pub use normalize::{
    DubboNormalizer, GrpcNormalizer, MetaDataRegisterRequest, Normalizer, SofaNormalizer,
    SpringCloudNormalizer, SpringCloudRegisterRequest, SpringMvcNormalizer,
    SpringMvcRegisterRequest, TarsNormalizer,
};
pub use service::DefaultRegisterService;
pub use traits::{RegisterService, RegistryStorage};
pub use types::{
    Condition, MetaData, MetaDataRegister, RegisterPayload, RpcType, Rule, Selector,
    SpringCloudRegister, SpringMvcRegister, Upstream,
};
