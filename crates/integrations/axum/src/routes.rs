//! Route mounting for the registration endpoints.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use rpc_register_core::{
    DubboNormalizer, GrpcNormalizer, Normalizer, RegisterService, SofaNormalizer,
    SpringCloudNormalizer, SpringMvcNormalizer, TarsNormalizer,
};
use rpc_register_events::{ChangeType, RegisterEventPublisher};
use std::sync::Arc;

use crate::{RegisterErrorResponse, SUCCESS};

/// Creates an Axum router with one registration endpoint per dialect.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/register-client", register_routes(publisher, service));
/// ```
pub fn register_routes<S>(
    publisher: Arc<RegisterEventPublisher>,
    service: Arc<dyn RegisterService>,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/springmvc-register", post(register::<SpringMvcNormalizer>))
        .route("/springcloud-register", post(register::<SpringCloudNormalizer>))
        .route("/dubbo-register", post(register::<DubboNormalizer>))
        .route("/sofa-register", post(register::<SofaNormalizer>))
        .route("/tars-register", post(register::<TarsNormalizer>))
        .route("/grpc-register", post(register::<GrpcNormalizer>))
        .with_state(RegisterState { publisher, service })
}

/// Shared state for registration routes.
#[derive(Clone)]
struct RegisterState {
    publisher: Arc<RegisterEventPublisher>,
    service: Arc<dyn RegisterService>,
}

/// Normalizes one dialect's body and publishes it.
///
/// The publisher is started lazily by whichever request arrives first.
async fn register<N: Normalizer>(
    State(state): State<RegisterState>,
    Json(request): Json<N::Request>,
) -> Result<&'static str, RegisterErrorResponse> {
    state.publisher.start(Arc::clone(&state.service))?;

    let payload = N::normalize(request).inspect_err(|e| {
        tracing::debug!(rpc_type = %N::RPC_TYPE, error = %e, "Rejected registration");
    })?;

    state
        .publisher
        .publish(ChangeType::Register, N::RPC_TYPE, payload)
        .await
        .inspect_err(|e| {
            tracing::warn!(rpc_type = %N::RPC_TYPE, error = %e, "Registration not admitted");
        })?;

    Ok(SUCCESS)
}
