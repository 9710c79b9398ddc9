//! # RPC Register Events
//!
//! The registration event pipeline:
//! - Canonical, immutable registration events
//! - A start-once publisher with bounded, partitioned channels
//! - Consumers that apply events through the registration service
//! - Pipeline counters
//!
//! ## Example
//!
//! ```rust,ignore
//! use rpc_register_events::{ChangeType, RegisterEventPublisher};
//!
//! let publisher = RegisterEventPublisher::global();
//! publisher.start(service)?;
//!
//! let payload = SpringMvcNormalizer::normalize(request)?;
//! publisher.publish(ChangeType::Register, RpcType::Http, payload).await?;
//! ```

mod config;
mod consumer;
mod error;
mod event;
mod handler;
mod publisher;
mod stats;

pub use config::{BackpressurePolicy, PublisherConfig};
pub use consumer::RegisterConsumer;
pub use error::{PublishError, PublishResult};
pub use event::{ChangeType, RegisterEvent};
pub use handler::RegisterEventHandler;
pub use publisher::RegisterEventPublisher;
pub use stats::{PublisherStats, StatsSnapshot};
