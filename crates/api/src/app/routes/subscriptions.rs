use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use adsmarket_core::OrderId;

use crate::app::routes::common::{blocking, parse_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PartnerContext;
use crate::middleware::{identity_middleware, IdentityState};

pub fn router(identity: IdentityState) -> Router {
    Router::new()
        .route("/", get(list_mine))
        .route("/all", get(list_all))
        .route("/stats", get(stats))
        .route("/:id", get(get_subscription))
        .route_layer(axum::middleware::from_fn_with_state(identity, identity_middleware))
}

pub async fn list_mine(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: Option<Extension<PartnerContext>>,
    Query(query): Query<dto::SubscriptionQuery>,
) -> axum::response::Response {
    let email = match (ctx, query.partner_email) {
        (Some(Extension(ctx)), _) => ctx.into_identity().email,
        (None, Some(email)) if !email.trim().is_empty() => email,
        _ => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                "partnerEmail query parameter is required",
            );
        }
    };

    blocking(move || match services.subscriptions.list_for_partner(&email, Utc::now()) {
        Ok(subscriptions) => Json(subscriptions).into_response(),
        Err(e) => errors::subscription_error_to_response(e),
    })
    .await
}

pub async fn list_all(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    blocking(move || match services.subscriptions.list_all(Utc::now()) {
        Ok(subscriptions) => Json(subscriptions).into_response(),
        Err(e) => errors::subscription_error_to_response(e),
    })
    .await
}

pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    blocking(move || match services.subscriptions.stats(Utc::now()) {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => errors::subscription_error_to_response(e),
    })
    .await
}

/// A token-identified partner only sees their own subscriptions.
pub async fn get_subscription(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: Option<Extension<PartnerContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let viewer = ctx.map(|Extension(ctx)| ctx.into_identity().email);
    blocking(move || {
        let found = match services.subscriptions.get_by_id(&id, Utc::now()) {
            Ok(found) => found,
            Err(e) => return errors::subscription_error_to_response(e),
        };
        let visible =
            found.filter(|s| viewer.as_ref().is_none_or(|email| *email == s.partner_email));
        match visible {
            Some(subscription) => Json(subscription).into_response(),
            None => errors::not_found("subscription"),
        }
    })
    .await
}
