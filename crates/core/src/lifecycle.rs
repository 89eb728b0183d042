//! Lifecycle states shared by the ordering and subscription modules.

use serde::{Deserialize, Serialize};

/// Order status. Orders are only ever created in their confirmed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Confirmed,
}

/// Subscription status.
///
/// Expired subscriptions are deleted rather than transitioned, so a stored
/// subscription is always active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
}
