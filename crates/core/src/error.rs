//! Errors for malformed input reaching the domain layer.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Input the domain refuses to work with. Business outcomes such as an
/// over-quota selection are values, not errors of this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// e.g. a partner without an email cannot key a subscription.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
