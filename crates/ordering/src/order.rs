//! Order confirmation: quote redemption, provisioning and billing.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adsmarket_catalog::Catalog;
use adsmarket_core::{
    Entity, EntityStore, InMemoryStore, InstanceId, KeyValueStore, Money, OrderId, OrderStatus,
    PartnerIdentity, QuoteId, StoreError,
};

use crate::error::{ConfirmationError, ErrorCode, ValidationError};
use crate::handoff::{SubscriptionHandoff, SubscriptionRef};
use crate::pricing::PricingEngine;
use crate::quote::{Quote, QuoteStore};
use crate::selection::{ProvisionedOffering, Selection};
use crate::validation::SelectionValidator;

/// Partner snapshot recorded on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPartner {
    pub email: String,
    pub company_name: Option<String>,
}

impl From<&PartnerIdentity> for OrderPartner {
    fn from(partner: &PartnerIdentity) -> Self {
        Self {
            email: partner.email.clone(),
            company_name: partner.company_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingLine {
    pub offering_id: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Billing {
    pub total: Money,
    pub lines: Vec<BillingLine>,
}

/// A confirmed order. Created once per successful confirmation, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<QuoteId>,
    pub partner: OrderPartner,
    pub selections: Vec<Selection>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub instances: Vec<InstanceId>,
    pub billing: Billing,
    /// The offering the order's subscription is keyed on (first selection).
    pub offering: ProvisionedOffering,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

/// One provisioned unit of an order, one per selection line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: InstanceId,
    pub offering_id: String,
    pub order_id: OrderId,
    pub selection: Selection,
    pub created_at: DateTime<Utc>,
}

impl Entity for Instance {
    type Id = InstanceId;

    fn id(&self) -> &InstanceId {
        &self.id
    }
}

/// Confirmation input: either a quote to redeem or selections to buy directly.
/// A quote id wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub quote_id: Option<QuoteId>,
    #[serde(default)]
    pub selections: Option<Vec<Selection>>,
}

impl OrderRequest {
    pub fn redeem(quote_id: QuoteId) -> Self {
        Self {
            quote_id: Some(quote_id),
            selections: None,
        }
    }

    pub fn direct(selections: Vec<Selection>) -> Self {
        Self {
            quote_id: None,
            selections: Some(selections),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub offering: ProvisionedOffering,
    pub billing: Money,
    pub subscription: SubscriptionRef,
}

pub type OrderStore = Arc<dyn KeyValueStore<OrderId, Order>>;
pub type InstanceStore = Arc<dyn KeyValueStore<InstanceId, Instance>>;
/// Redeemed quote -> the order that redeemed it.
pub type RedemptionStore = Arc<dyn KeyValueStore<QuoteId, OrderId>>;

/// Stores the ordering services run against.
#[derive(Clone)]
pub struct OrderStores {
    pub quotes: QuoteStore,
    pub orders: OrderStore,
    pub instances: InstanceStore,
    pub redemptions: RedemptionStore,
}

impl OrderStores {
    /// Process-lifetime stores.
    pub fn in_memory() -> Self {
        Self {
            quotes: Arc::new(InMemoryStore::<QuoteId, Quote>::new()),
            orders: Arc::new(InMemoryStore::<OrderId, Order>::new()),
            instances: Arc::new(InMemoryStore::<InstanceId, Instance>::new()),
            redemptions: Arc::new(InMemoryStore::<QuoteId, OrderId>::new()),
        }
    }
}

pub struct OrderService {
    catalog: Arc<Catalog>,
    validator: SelectionValidator,
    pricing: PricingEngine,
    stores: OrderStores,
    subscriptions: Arc<dyn SubscriptionHandoff>,
    // Serializes the redeemed-check and the redemption record.
    redeem: Mutex<()>,
}

impl OrderService {
    pub fn new(
        catalog: Arc<Catalog>,
        stores: OrderStores,
        subscriptions: Arc<dyn SubscriptionHandoff>,
    ) -> Self {
        Self {
            validator: SelectionValidator::new(catalog.clone()),
            pricing: PricingEngine::new(catalog.clone()),
            catalog,
            stores,
            subscriptions,
            redeem: Mutex::new(()),
        }
    }

    pub fn confirm(
        &self,
        request: OrderRequest,
        partner: &PartnerIdentity,
        now: DateTime<Utc>,
    ) -> Result<OrderConfirmation, ConfirmationError> {
        partner
            .ensure_keyable()
            .map_err(|e| ConfirmationError::BadRequest(e.to_string()))?;

        let _guard = self
            .redeem
            .lock()
            .map_err(|_| StoreError::Unavailable("redemption lock poisoned".into()))?;

        let (quote, selections) = self.resolve(request)?;

        let errors = self.validator.validate_all(&selections);
        if !errors.is_empty() {
            tracing::info!(errors = errors.len(), "confirmation rejected by re-validation");
            return Err(ConfirmationError::Rejected(errors));
        }

        let lines = self.bill(&selections)?;
        let total = match &quote {
            Some(quote) => quote.price.clone(),
            None => sum(&lines, self.pricing.currency())?,
        };

        let order_id = OrderId::new();
        let instances: Vec<Instance> = selections
            .iter()
            .map(|selection| Instance {
                id: InstanceId::new(),
                offering_id: selection.offering_id.clone(),
                order_id,
                selection: selection.clone(),
                created_at: now,
            })
            .collect();

        // Selections are non-empty and re-validated, so the first offering exists.
        let first = &selections[0];
        let kind = self
            .catalog
            .offering(&first.offering_id)
            .map(|o| o.kind)
            .unwrap_or_default();

        let order = Order {
            id: order_id,
            quote_id: quote.as_ref().map(|q| q.id),
            partner: OrderPartner::from(partner),
            offering: ProvisionedOffering::from_selection(kind, first),
            selections,
            status: OrderStatus::Confirmed,
            created_at: now,
            instances: instances.iter().map(|i| i.id).collect(),
            billing: Billing {
                total: total.clone(),
                lines,
            },
        };

        // Persist first: a subscription must never outlive a failed save.
        if let Err(e) = self.persist(&order, instances) {
            self.discard(&order);
            return Err(e.into());
        }
        let subscription = match self.subscriptions.order_confirmed(&order, partner, now) {
            Ok(subscription) => subscription,
            Err(e) => {
                self.discard(&order);
                return Err(ConfirmationError::Subscription(e.to_string()));
            }
        };
        let offering = order.offering.clone();

        tracing::info!(
            order_id = %order_id,
            partner = %partner.email,
            offering_id = %offering.id,
            total = total.amount,
            redeemed = quote.is_some(),
            "order confirmed"
        );

        Ok(OrderConfirmation {
            order_id,
            offering,
            billing: total,
            subscription,
        })
    }

    fn persist(&self, order: &Order, instances: Vec<Instance>) -> Result<(), StoreError> {
        for instance in instances {
            self.stores.instances.save(instance)?;
        }
        if let Some(quote_id) = order.quote_id {
            self.stores.redemptions.put(quote_id, order.id)?;
        }
        self.stores.orders.save(order.clone())
    }

    /// Best-effort removal of everything `persist` may have written.
    fn discard(&self, order: &Order) {
        let mut failures = 0;
        for id in &order.instances {
            failures += usize::from(self.stores.instances.delete(id).is_err());
        }
        if let Some(quote_id) = &order.quote_id {
            failures += usize::from(self.stores.redemptions.delete(quote_id).is_err());
        }
        failures += usize::from(self.stores.orders.delete(&order.id).is_err());
        if failures > 0 {
            tracing::warn!(order_id = %order.id, failures, "order rollback incomplete");
        }
    }

    pub fn get(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        self.stores.orders.get(id)
    }

    pub fn instance(&self, id: &InstanceId) -> Result<Option<Instance>, StoreError> {
        self.stores.instances.get(id)
    }

    pub fn instances_for(&self, order: &Order) -> Result<Vec<Instance>, StoreError> {
        let mut found = Vec::with_capacity(order.instances.len());
        for id in &order.instances {
            if let Some(instance) = self.stores.instances.get(id)? {
                found.push(instance);
            }
        }
        Ok(found)
    }

    fn resolve(
        &self,
        request: OrderRequest,
    ) -> Result<(Option<Quote>, Vec<Selection>), ConfirmationError> {
        if let Some(quote_id) = request.quote_id {
            let quote = self
                .stores
                .quotes
                .get(&quote_id)?
                .ok_or(ConfirmationError::InvalidQuote(quote_id))?;
            if self.stores.redemptions.get(&quote_id)?.is_some() {
                return Err(ConfirmationError::QuoteRedeemed(quote_id));
            }
            let selections = quote.selections.clone();
            return Ok((Some(quote), selections));
        }

        match request.selections {
            Some(selections) if !selections.is_empty() => Ok((None, selections)),
            _ => Err(ConfirmationError::BadRequest(
                "quoteId or a non-empty selections[] array is required".into(),
            )),
        }
    }

    /// Fresh per-selection prices. Any failure rejects the confirmation.
    fn bill(&self, selections: &[Selection]) -> Result<Vec<BillingLine>, ConfirmationError> {
        selections
            .iter()
            .map(|selection| {
                self.pricing
                    .price(selection)
                    .map(|amount| BillingLine {
                        offering_id: selection.offering_id.clone(),
                        amount,
                    })
                    .map_err(|e| {
                        ConfirmationError::Rejected(vec![ValidationError::new(
                            ErrorCode::PriceError,
                            format!("Cannot compute price for {}: {e}", selection.offering_id),
                        )])
                    })
            })
            .collect()
    }
}

fn sum(lines: &[BillingLine], currency: &str) -> Result<Money, ConfirmationError> {
    lines
        .iter()
        .try_fold(Money::zero(currency), |acc, line| acc.checked_add(&line.amount))
        .ok_or_else(|| {
            ConfirmationError::Rejected(vec![ValidationError::new(
                ErrorCode::PriceError,
                "order total overflows",
            )])
        })
}
