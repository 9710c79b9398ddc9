//! # RPC Register Server
//!
//! Standalone registration server. Services post their registrations to
//! the endpoints mounted under the configured base path; the process-wide
//! publisher applies them to the in-memory registry in order.

mod config;

pub use config::{
    load_config, BackpressureSetting, Config, ConfigError, PublisherSettings, ServerConfig,
};

use axum::Router;
use rpc_register_adapter_memory::MemoryAdapter;
use rpc_register_axum::register_routes;
use rpc_register_core::{DataChangeBus, DefaultRegisterService, RegisterService};
use rpc_register_events::{PublishError, PublisherConfig, RegisterEventPublisher};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Server error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The registration server.
pub struct RegistryServer {
    /// Server configuration.
    pub config: Config,
    adapter: Arc<MemoryAdapter>,
    publisher: Arc<RegisterEventPublisher>,
    service: Arc<dyn RegisterService>,
    changes: DataChangeBus,
}

impl RegistryServer {
    /// Creates a server around the process-wide publisher.
    ///
    /// The publisher settings only take effect if nothing installed the
    /// global publisher earlier, and only the first server to start it
    /// receives the events.
    pub fn new(config: Config) -> Self {
        let publisher = RegisterEventPublisher::init_global(PublisherConfig::from(&config.publisher));
        let adapter = Arc::new(MemoryAdapter::new());
        let changes = DataChangeBus::default();
        let service: Arc<dyn RegisterService> = Arc::new(DefaultRegisterService::with_changes(
            adapter.clone(),
            changes.clone(),
        ));

        Self {
            config,
            adapter,
            publisher,
            service,
            changes,
        }
    }

    /// Returns the registry storage.
    pub fn adapter(&self) -> &Arc<MemoryAdapter> {
        &self.adapter
    }

    /// Returns the publisher.
    pub fn publisher(&self) -> &Arc<RegisterEventPublisher> {
        &self.publisher
    }

    /// Returns the bus routing-data changes are announced on.
    pub fn changes(&self) -> &DataChangeBus {
        &self.changes
    }

    /// Builds the application router.
    pub fn router(&self) -> Router {
        let routes = register_routes(self.publisher.clone(), self.service.clone());
        match self.config.server.base_path.trim_end_matches('/') {
            "" => Router::new().merge(routes),
            base_path => Router::new().nest(base_path, routes),
        }
    }

    /// Starts the server and serves until Ctrl-C.
    pub async fn run(&self) -> Result<(), ServerError> {
        // Consumers are normally wired by the first request; starting here
        // lets startup problems surface before the port opens.
        self.publisher.start(self.service.clone())?;
        tokio::spawn(log_changes(self.changes.clone()));

        let addr = self.config.server.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(
            addr = %addr,
            base_path = %self.config.server.base_path,
            workers = self.publisher.partitions(),
            "Registration server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        let stats = self.publisher.stats();
        tracing::info!(
            published = stats.published,
            rejected = stats.rejected,
            processed = stats.processed,
            failed = stats.failed,
            in_flight = stats.in_flight(),
            "Registration server stopped"
        );
        Ok(())
    }
}

impl Default for RegistryServer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

async fn log_changes(changes: DataChangeBus) {
    let mut rx = changes.subscribe();
    loop {
        match rx.recv().await {
            Ok(change) => tracing::debug!(
                kind = ?change.kind(),
                action = %change.action,
                id = %change.id(),
                "Routing data changed"
            ),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Change log lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
