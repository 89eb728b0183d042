use std::str::FromStr;

use axum::extract::Extension;
use axum::http::StatusCode;

use adsmarket_core::{DomainError, PartnerIdentity};
use adsmarket_ordering::{ErrorCode, ValidationError};

use crate::app::errors;
use crate::context::PartnerContext;

/// The caller's identity: token-derived when available, else the one
/// supplied with the request.
pub fn partner_or(
    ctx: Option<Extension<PartnerContext>>,
    supplied: Option<PartnerIdentity>,
) -> Result<PartnerIdentity, axum::response::Response> {
    if let Some(Extension(ctx)) = ctx {
        return Ok(ctx.into_identity());
    }
    supplied.filter(|p| !p.email.trim().is_empty()).ok_or_else(|| {
        errors::rejected(
            StatusCode::BAD_REQUEST,
            vec![ValidationError::new(ErrorCode::BadRequest, "partner.email is required")],
        )
    })
}

pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(|e: DomainError| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string())
    })
}

/// Run store work that may block (SQLite commits, service mutexes) on the
/// blocking pool instead of an async worker.
pub async fn blocking<F>(work: F) -> axum::response::Response
where
    F: FnOnce() -> axum::response::Response + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "blocking handler task failed");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "request could not be completed",
            )
        }
    }
}
