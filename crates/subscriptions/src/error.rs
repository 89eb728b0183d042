use thiserror::Error;

use adsmarket_core::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("invalid subscription data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubscriptionError {
    /// Stable code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            SubscriptionError::InvalidData(_) => "INVALID_SUBSCRIPTION_DATA",
            SubscriptionError::Store(_) => "STORE_UNAVAILABLE",
        }
    }
}
