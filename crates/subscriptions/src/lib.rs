//! Subscriptions created from confirmed orders.
//!
//! [`SubscriptionManager`] implements the ordering crate's handoff boundary
//! and keeps at most one live subscription per partner and offering.

pub mod error;
pub mod manager;
pub mod subscription;

pub use error::SubscriptionError;
pub use manager::{
    DEFAULT_TERM_DAYS, Renewal, SubscriptionManager, SubscriptionStats, SubscriptionStore,
    remaining_days,
};
pub use subscription::Subscription;
