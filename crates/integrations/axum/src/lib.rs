//! # RPC Register Axum Integration
//!
//! This crate exposes the registration endpoints services call when they
//! come up. Each endpoint normalizes its dialect's body and hands the
//! result to the [`RegisterEventPublisher`](rpc_register_events::RegisterEventPublisher);
//! persistence happens asynchronously on the publisher's consumers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axum::Router;
//! use rpc_register_axum::register_routes;
//!
//! let app = Router::new()
//!     .nest("/register-client", register_routes(publisher, service));
//! ```

mod routes;

pub use routes::register_routes;

use http::StatusCode;
use axum::response::{IntoResponse, Response};
use rpc_register_core::RegisterError;
use rpc_register_events::PublishError;
use serde::Serialize;

/// Response body returned by every endpoint on success.
pub const SUCCESS: &str = "success";

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

/// Wrapper for PublishError that implements IntoResponse.
#[derive(Debug)]
pub struct RegisterErrorResponse(pub PublishError);

impl IntoResponse for RegisterErrorResponse {
    fn into_response(self) -> Response {
        let code = self.0.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.0.to_string(),
            code,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<PublishError> for RegisterErrorResponse {
    fn from(err: PublishError) -> Self {
        RegisterErrorResponse(err)
    }
}

impl From<RegisterError> for RegisterErrorResponse {
    fn from(err: RegisterError) -> Self {
        RegisterErrorResponse(PublishError::Invalid(err))
    }
}
