//! `adsmarket-core`: shared building blocks for the marketplace engine.
//!
//! This crate contains **pure domain** primitives (identifiers, money, partner
//! identity, lifecycle vocabulary) plus the key-value store boundary every
//! service is built against.

pub mod entity;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod partner;
pub mod store;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{InstanceId, OrderId, QuoteId};
pub use lifecycle::{OrderStatus, SubscriptionStatus};
pub use partner::{IdentityError, IdentityProvider, PartnerIdentity};
pub use store::{EntityStore, InMemoryStore, KeyValueStore, StoreError};
pub use value_object::Money;
