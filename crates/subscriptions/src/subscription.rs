use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adsmarket_core::{Entity, Money, OrderId, SubscriptionStatus};
use adsmarket_ordering::{Durability, ProvisionedOffering, SubscriptionRef};

/// A partner's entitlement to one offering for a period of time.
///
/// Keyed by the id of the order that created (or last renewed) it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: OrderId,
    pub order_id: OrderId,
    pub partner_email: String,
    #[serde(default)]
    pub partner_company_name: Option<String>,
    pub offering: ProvisionedOffering,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub billing: Money,
}

impl Entity for Subscription {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

impl Subscription {
    /// Live until its expiration instant, exclusive.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date <= now
    }

    pub fn key_matches(&self, partner_email: &str, offering_id: &str) -> bool {
        self.partner_email == partner_email && self.offering.id == offering_id
    }

    pub fn to_ref(&self, renewed_from: Option<OrderId>, durability: Durability) -> SubscriptionRef {
        SubscriptionRef {
            id: self.id,
            status: self.status,
            start_date: self.start_date,
            expiration_date: self.expiration_date,
            renewed_from,
            durability,
        }
    }
}
