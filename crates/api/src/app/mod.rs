//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: catalog, stores and service construction
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use adsmarket_core::IdentityProvider;

use crate::middleware::IdentityState;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `identity` guards the partner routes; `None` means partner identity is
/// read from the request itself.
pub fn build_app(
    services: services::AppServices,
    identity: Option<Arc<dyn IdentityProvider>>,
) -> Router {
    let services = Arc::new(services);
    let identity = IdentityState { provider: identity };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(identity))
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
