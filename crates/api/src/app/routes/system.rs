use axum::{response::IntoResponse, Json};
use chrono::Utc;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "time": Utc::now(),
    }))
}
