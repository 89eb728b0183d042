use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items))
        .route("/offerings", get(list_offerings))
        .route("/offerings/:id", get(get_offering))
}

pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.catalog.items())
}

pub async fn list_offerings(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.catalog.offerings().to_vec())
}

pub async fn get_offering(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.catalog.offering(&id) {
        Some(offering) => Json(offering.clone()).into_response(),
        None => errors::not_found("offering"),
    }
}
