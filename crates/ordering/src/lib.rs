//! Quote and order pipeline.
//!
//! Selections are validated against the catalog, priced, turned into quotes
//! and finally confirmed into orders. Confirmed orders are handed to a
//! [`SubscriptionHandoff`] implementation.

pub mod error;
pub mod handoff;
pub mod order;
pub mod pricing;
pub mod quote;
pub mod selection;
pub mod validation;

pub use error::{ConfirmationError, ErrorCode, PricingError, QuoteError, ValidationError};
pub use handoff::{Durability, HandoffError, SubscriptionHandoff, SubscriptionRef};
pub use order::{
    Billing, BillingLine, Instance, Order, OrderConfirmation, OrderPartner, OrderRequest,
    OrderService, OrderStores,
};
pub use pricing::PricingEngine;
pub use quote::{Quote, QuoteService};
pub use selection::{ProvisionedOffering, Selection};
pub use validation::SelectionValidator;
