//! Boundary between order confirmation and subscription management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adsmarket_core::{OrderId, PartnerIdentity, SubscriptionStatus};

use crate::order::Order;

/// Whether a mutation reached durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Durability {
    #[default]
    Persisted,
    /// Applied in memory but not yet committed; the store commits it along
    /// with its next successful write.
    Degraded,
}

impl Durability {
    pub fn is_degraded(self) -> bool {
        self == Durability::Degraded
    }
}

/// Summary of the subscription an order produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRef {
    pub id: OrderId,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    /// Set when an existing subscription was extended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewed_from: Option<OrderId>,
    #[serde(default)]
    pub durability: Durability,
}

/// Failure to record a subscription for a confirmed order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct HandoffError {
    pub code: &'static str,
    pub message: String,
}

impl HandoffError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Receives every confirmed order exactly once.
pub trait SubscriptionHandoff: Send + Sync {
    fn order_confirmed(
        &self,
        order: &Order,
        partner: &PartnerIdentity,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionRef, HandoffError>;
}
