use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use adsmarket_core::{InstanceId, OrderId, QuoteId};

use crate::app::routes::common::{blocking, parse_id, partner_or};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PartnerContext;
use crate::middleware::{identity_middleware, IdentityState};

pub fn router(identity: IdentityState) -> Router {
    Router::new()
        .route("/validate", post(validate))
        .route("/confirm", post(confirm))
        .route_layer(axum::middleware::from_fn_with_state(identity, identity_middleware))
        .route("/quote/:id", get(get_quote))
        .route("/order/:id", get(get_order))
        .route("/instance/:id", get(get_instance))
}

fn bad_body(rejection: JsonRejection) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", rejection.body_text())
}

pub async fn validate(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: Option<Extension<PartnerContext>>,
    body: Result<Json<dto::ValidateRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let partner = ctx.map(|Extension(c)| c.into_identity()).or(body.partner);

    match services.quotes.quote(body.selections, Utc::now()) {
        Ok(quote) => Json(dto::QuoteResponse::new(quote, partner.as_ref())).into_response(),
        Err(e) => errors::quote_error_to_response(e),
    }
}

pub async fn confirm(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: Option<Extension<PartnerContext>>,
    body: Result<Json<dto::ConfirmRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let partner = match partner_or(ctx, body.partner) {
        Ok(partner) => partner,
        Err(resp) => return resp,
    };

    blocking(move || match services.orders.confirm(body.order, &partner, Utc::now()) {
        Ok(confirmation) => (
            StatusCode::CREATED,
            Json(dto::ConfirmResponse {
                confirmation,
                partner: (&partner).into(),
            }),
        )
            .into_response(),
        Err(e) => errors::confirmation_error_to_response(e),
    })
    .await
}

pub async fn get_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: QuoteId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.quotes.get(&id) {
        Ok(Some(quote)) => Json(quote).into_response(),
        Ok(None) => errors::not_found("quote"),
        Err(e) => errors::quote_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.orders.get(&id) {
        Ok(Some(order)) => Json(order).into_response(),
        Ok(None) => errors::not_found("order"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_instance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InstanceId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.orders.instance(&id) {
        Ok(Some(instance)) => Json(instance).into_response(),
        Ok(None) => errors::not_found("instance"),
        Err(e) => errors::store_error_to_response(e),
    }
}
