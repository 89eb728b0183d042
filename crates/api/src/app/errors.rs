use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use adsmarket_core::{IdentityError, StoreError};
use adsmarket_ordering::{ConfirmationError, QuoteError, ValidationError};
use adsmarket_subscriptions::SubscriptionError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `{"error": true, "errors": [..]}`: a request rejected for coded reasons.
pub fn rejected(status: StatusCode, errors: Vec<ValidationError>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": true,
            "errors": errors,
        })),
    )
        .into_response()
}

pub fn not_found(what: &str) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}

pub fn identity_error_to_response(err: IdentityError) -> axum::response::Response {
    let status = match err {
        IdentityError::MissingCredential | IdentityError::InvalidCredential(_) => {
            StatusCode::UNAUTHORIZED
        }
        IdentityError::Forbidden => StatusCode::FORBIDDEN,
        IdentityError::Unreachable(_) => StatusCode::BAD_GATEWAY,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store failure");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
}

pub fn quote_error_to_response(err: QuoteError) -> axum::response::Response {
    match err {
        QuoteError::EmptySelections => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "valid": false,
                "errors": [{"code": "BAD_REQUEST", "message": err.to_string()}],
            })),
        )
            .into_response(),
        QuoteError::Store(e) => store_error_to_response(e),
    }
}

pub fn confirmation_error_to_response(err: ConfirmationError) -> axum::response::Response {
    match err {
        ConfirmationError::Store(e) => store_error_to_response(e),
        ConfirmationError::Subscription(msg) => {
            tracing::error!(error = %msg, "subscription handoff failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "subscription_error", msg)
        }
        other => rejected(StatusCode::BAD_REQUEST, other.errors()),
    }
}

pub fn subscription_error_to_response(err: SubscriptionError) -> axum::response::Response {
    match err {
        SubscriptionError::InvalidData(_) => {
            json_error(StatusCode::BAD_REQUEST, err.code(), err.to_string())
        }
        SubscriptionError::Store(e) => store_error_to_response(e),
    }
}
