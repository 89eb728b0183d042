use axum::Router;

use crate::middleware::IdentityState;

pub mod catalog;
pub mod common;
pub mod order;
pub mod subscriptions;
pub mod system;

/// Router for every marketplace endpoint except `/health`.
pub fn router(identity: IdentityState) -> Router {
    Router::new()
        .nest("/catalog", catalog::router())
        .nest("/order", order::router(identity.clone()))
        .nest("/subscriptions", subscriptions::router(identity))
}
