use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use adsmarket_core::{IdentityError, IdentityProvider};

use crate::app::errors;
use crate::context::PartnerContext;

#[derive(Clone)]
pub struct IdentityState {
    pub provider: Option<Arc<dyn IdentityProvider>>,
}

/// Resolve the bearer token into a [`PartnerContext`].
///
/// Without a configured provider requests pass through untouched and
/// handlers read the partner from the request itself.
pub async fn identity_middleware(
    State(state): State<IdentityState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(provider) = state.provider else {
        return next.run(req).await;
    };

    let token = match extract_bearer(req.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => return errors::identity_error_to_response(e),
    };

    match provider.resolve(&token).await {
        Ok(identity) => {
            tracing::debug!(partner = %identity.email, "partner resolved");
            req.extensions_mut().insert(PartnerContext::new(identity));
            next.run(req).await
        }
        Err(e) => {
            tracing::info!(code = e.code(), error = %e, "partner identity rejected");
            errors::identity_error_to_response(e)
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, IdentityError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(IdentityError::MissingCredential)?;

    let header = header
        .to_str()
        .map_err(|_| IdentityError::InvalidCredential("malformed authorization header".into()))?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| IdentityError::InvalidCredential("expected a bearer token".into()))?;

    let token = header.trim();
    if token.is_empty() {
        return Err(IdentityError::MissingCredential);
    }

    Ok(token)
}
