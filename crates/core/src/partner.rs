//! Partner identity and the identity-provider boundary.
//!
//! Authentication itself happens elsewhere: an external identity service turns
//! a bearer credential into a [`PartnerIdentity`]. The marketplace only keys
//! orders and subscriptions off the identity it is handed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{DomainError, DomainResult};

/// Identity record of an authenticated partner.
///
/// `email` is the partner key for subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerIdentity {
    pub email: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl PartnerIdentity {
    pub fn new(email: impl Into<String>, company_name: Option<String>) -> Self {
        Self {
            email: email.into(),
            company_name,
            address: None,
            city: None,
            country: None,
        }
    }

    /// Reject identities that cannot key a subscription.
    pub fn ensure_keyable(&self) -> DomainResult<()> {
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("partner email is required"));
        }
        Ok(())
    }
}

/// Failure to resolve a partner identity upstream.
///
/// Kept distinct from validation failures so callers never confuse
/// "bad request" with "not authenticated".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no credential provided")]
    MissingCredential,

    #[error("credential rejected: {0}")]
    InvalidCredential(String),

    #[error("partner is not allowed to use the marketplace")]
    Forbidden,

    #[error("identity service unreachable: {0}")]
    Unreachable(String),
}

impl IdentityError {
    /// Stable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::MissingCredential => "AUTH_MISSING_TOKEN",
            IdentityError::InvalidCredential(_) => "AUTH_INVALID_TOKEN",
            IdentityError::Forbidden => "AUTH_FORBIDDEN",
            IdentityError::Unreachable(_) => "AUTH_UNAVAILABLE",
        }
    }
}

/// Resolves a bearer credential into a partner identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, credential: &str) -> Result<PartnerIdentity, IdentityError>;
}
