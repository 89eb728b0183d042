//! Subscription lifecycle: create, renew, reap.
//!
//! At most one live subscription exists per (partner email, offering id).
//! Expired subscriptions are deleted lazily whenever the store is scanned.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use adsmarket_core::{
    EntityStore, KeyValueStore, OrderId, PartnerIdentity, StoreError, SubscriptionStatus,
};
use adsmarket_ordering::{Durability, HandoffError, Order, SubscriptionHandoff, SubscriptionRef};

use crate::error::SubscriptionError;
use crate::subscription::Subscription;

pub const DEFAULT_TERM_DAYS: u32 = 30;

pub type SubscriptionStore = Arc<dyn KeyValueStore<OrderId, Subscription>>;

/// Outcome of [`SubscriptionManager::create_or_renew`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewal {
    pub subscription: Subscription,
    /// Id of the live subscription this one replaced.
    pub renewed_from: Option<OrderId>,
    pub reaped: usize,
    pub durability: Durability,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStats {
    pub total_subscriptions: usize,
    pub by_partner: BTreeMap<String, usize>,
    pub by_offering: BTreeMap<String, usize>,
}

pub struct SubscriptionManager {
    store: SubscriptionStore,
    term: Duration,
    lock: Mutex<()>,
}

impl SubscriptionManager {
    pub fn new(store: SubscriptionStore) -> Self {
        Self::with_term_days(store, DEFAULT_TERM_DAYS)
    }

    pub fn with_term_days(store: SubscriptionStore, days: u32) -> Self {
        Self {
            store,
            term: Duration::days(i64::from(days)),
            lock: Mutex::new(()),
        }
    }

    /// Record the subscription for a confirmed order, extending a live one for
    /// the same partner and offering.
    pub fn create_or_renew(
        &self,
        order: &Order,
        partner: &PartnerIdentity,
        now: DateTime<Utc>,
    ) -> Result<Renewal, SubscriptionError> {
        if partner.email.trim().is_empty() {
            return Err(SubscriptionError::InvalidData("partner email is required".into()));
        }
        if order.offering.id.is_empty() {
            return Err(SubscriptionError::InvalidData("order has no offering".into()));
        }

        let _guard = self.guard()?;
        let mut durability = Durability::Persisted;
        let (live, reaped) = self.reap(now, &mut durability)?;

        let existing = live
            .into_iter()
            .find(|s| s.key_matches(&partner.email, &order.offering.id));

        let (start_date, expiration_date) = match &existing {
            Some(old) => {
                let remaining = remaining_days(old.expiration_date, now);
                track(self.store.delete(&old.id), &mut durability)?;
                (now, now + self.term + Duration::days(remaining))
            }
            None => (order.created_at, now + self.term),
        };

        let subscription = Subscription {
            id: order.id,
            order_id: order.id,
            partner_email: partner.email.clone(),
            partner_company_name: partner.company_name.clone(),
            offering: order.offering.clone(),
            status: SubscriptionStatus::Active,
            start_date,
            expiration_date,
            billing: order.billing.total.clone(),
        };
        track(self.store.save(subscription.clone()), &mut durability)?;

        let renewed_from = existing.map(|old| old.id);
        tracing::info!(
            subscription_id = %subscription.id,
            partner = %subscription.partner_email,
            offering_id = %subscription.offering.id,
            expiration = %subscription.expiration_date,
            renewed = renewed_from.is_some(),
            degraded = durability.is_degraded(),
            "subscription recorded"
        );

        Ok(Renewal {
            subscription,
            renewed_from,
            reaped,
            durability,
        })
    }

    pub fn list_for_partner(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        let subscriptions: Vec<Subscription> = self
            .list_all(now)?
            .into_iter()
            .filter(|s| s.partner_email == email)
            .collect();
        tracing::debug!(
            partner = %email,
            count = subscriptions.len(),
            "partner subscriptions listed"
        );
        Ok(subscriptions)
    }

    pub fn get_by_id(
        &self,
        id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        Ok(self.list_all(now)?.into_iter().find(|s| &s.id == id))
    }

    /// Every live subscription, ordered by id.
    pub fn list_all(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>, SubscriptionError> {
        let _guard = self.guard()?;
        let mut durability = Durability::Persisted;
        let (live, _) = self.reap(now, &mut durability)?;
        Ok(live)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Result<SubscriptionStats, SubscriptionError> {
        let live = self.list_all(now)?;
        let mut stats = SubscriptionStats {
            total_subscriptions: live.len(),
            ..SubscriptionStats::default()
        };
        for s in &live {
            *stats.by_partner.entry(s.partner_email.clone()).or_default() += 1;
            *stats.by_offering.entry(s.offering.id.clone()).or_default() += 1;
        }
        Ok(stats)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, SubscriptionError> {
        self.lock.lock().map_err(|_| {
            SubscriptionError::Store(StoreError::Unavailable("subscription lock poisoned".into()))
        })
    }

    /// Delete every expired subscription; returns the live ones and the reap count.
    fn reap(
        &self,
        now: DateTime<Utc>,
        durability: &mut Durability,
    ) -> Result<(Vec<Subscription>, usize), SubscriptionError> {
        let mut live = Vec::new();
        let mut reaped = 0;
        for (id, subscription) in self.store.scan()? {
            if subscription.is_expired(now) {
                track(self.store.delete(&id), durability)?;
                tracing::info!(
                    subscription_id = %id,
                    partner = %subscription.partner_email,
                    "subscription expired"
                );
                reaped += 1;
            } else {
                live.push(subscription);
            }
        }
        Ok((live, reaped))
    }
}

impl SubscriptionHandoff for SubscriptionManager {
    fn order_confirmed(
        &self,
        order: &Order,
        partner: &PartnerIdentity,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionRef, HandoffError> {
        let renewal = self
            .create_or_renew(order, partner, now)
            .map_err(|e| HandoffError::new(e.code(), e.to_string()))?;
        Ok(renewal.subscription.to_ref(renewal.renewed_from, renewal.durability))
    }
}

/// Whole days left before `expiration`, rounded up, never negative.
pub fn remaining_days(expiration: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let ms = (expiration - now).num_milliseconds().max(0);
    (ms + DAY_MS - 1) / DAY_MS
}

/// Durability failures degrade the outcome but keep the in-memory mutation.
fn track<T: Default>(
    result: Result<T, StoreError>,
    durability: &mut Durability,
) -> Result<T, SubscriptionError> {
    match result {
        Ok(value) => Ok(value),
        Err(StoreError::Durability(reason)) => {
            tracing::warn!(%reason, "subscription change not persisted");
            *durability = Durability::Degraded;
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsmarket_catalog::marketplace::{IMAGE_OFFER, VIDEO_OFFER};
    use adsmarket_core::{InMemoryStore, Money, OrderStatus};
    use adsmarket_ordering::{Billing, OrderPartner, ProvisionedOffering, Selection};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn partner(email: &str) -> PartnerIdentity {
        PartnerIdentity::new(email, Some("Acme".into()))
    }

    fn order(offering_id: &str, images: u32, at: DateTime<Utc>) -> Order {
        let selection = Selection::new(offering_id).with_images(images);
        Order {
            id: OrderId::new(),
            quote_id: None,
            partner: OrderPartner {
                email: "ads@acme.test".into(),
                company_name: Some("Acme".into()),
            },
            offering: ProvisionedOffering {
                id: offering_id.into(),
                images_count: Some(images),
                videos_count: None,
                models_count: None,
                count: None,
            },
            selections: vec![selection],
            status: OrderStatus::Confirmed,
            created_at: at,
            instances: vec![],
            billing: Billing {
                total: Money::new(1_000 * u64::from(images), "EUR"),
                lines: vec![],
            },
        }
    }

    fn manager() -> (SubscriptionManager, Arc<InMemoryStore<OrderId, Subscription>>) {
        let store = Arc::new(InMemoryStore::<OrderId, Subscription>::new());
        (SubscriptionManager::new(store.clone()), store)
    }

    #[test]
    fn first_order_creates_thirty_day_subscription() {
        let (manager, _) = manager();
        let o = order(IMAGE_OFFER, 2, t0());
        let renewal = manager.create_or_renew(&o, &partner("a@x.test"), t0()).unwrap();
        let s = renewal.subscription;
        assert_eq!(s.id, o.id);
        assert_eq!(s.order_id, o.id);
        assert_eq!(s.start_date, t0());
        assert_eq!(s.expiration_date, t0() + Duration::days(30));
        assert_eq!(s.billing, Money::new(2_000, "EUR"));
        assert_eq!(s.offering.images_count, Some(2));
        assert_eq!(renewal.renewed_from, None);
        assert_eq!(renewal.durability, Durability::Persisted);
    }

    #[test]
    fn second_order_ten_days_later_extends_by_remaining_days() {
        let (manager, store) = manager();
        let p = partner("a@x.test");
        let first = order(IMAGE_OFFER, 1, t0());
        manager.create_or_renew(&first, &p, t0()).unwrap();

        let later = t0() + Duration::days(10);
        let second = order(IMAGE_OFFER, 3, later);
        let renewal = manager.create_or_renew(&second, &p, later).unwrap();

        assert_eq!(renewal.renewed_from, Some(first.id));
        assert_eq!(renewal.subscription.id, second.id);
        assert_eq!(renewal.subscription.start_date, later);
        assert_eq!(renewal.subscription.expiration_date, later + Duration::days(50));

        let all = store.scan().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, second.id);
    }

    #[test]
    fn different_offerings_and_partners_are_independent() {
        let (manager, _) = manager();
        manager.create_or_renew(&order(IMAGE_OFFER, 1, t0()), &partner("a@x.test"), t0()).unwrap();
        manager.create_or_renew(&order(VIDEO_OFFER, 1, t0()), &partner("a@x.test"), t0()).unwrap();
        manager.create_or_renew(&order(IMAGE_OFFER, 1, t0()), &partner("b@x.test"), t0()).unwrap();

        assert_eq!(manager.list_all(t0()).unwrap().len(), 3);
        assert_eq!(manager.list_for_partner("a@x.test", t0()).unwrap().len(), 2);

        let stats = manager.stats(t0()).unwrap();
        assert_eq!(stats.total_subscriptions, 3);
        assert_eq!(stats.by_partner["a@x.test"], 2);
        assert_eq!(stats.by_offering[IMAGE_OFFER], 2);
    }

    #[test]
    fn expired_subscriptions_are_reaped_on_read() {
        let (manager, store) = manager();
        let o = order(IMAGE_OFFER, 1, t0());
        manager.create_or_renew(&o, &partner("a@x.test"), t0()).unwrap();

        let at_expiry = t0() + Duration::days(30);
        assert_eq!(manager.get_by_id(&o.id, at_expiry).unwrap(), None);
        assert!(manager.list_for_partner("a@x.test", at_expiry).unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn expired_key_starts_fresh() {
        let (manager, _) = manager();
        let p = partner("a@x.test");
        manager.create_or_renew(&order(IMAGE_OFFER, 1, t0()), &p, t0()).unwrap();

        let later = t0() + Duration::days(45);
        let renewal = manager.create_or_renew(&order(IMAGE_OFFER, 1, later), &p, later).unwrap();
        assert_eq!(renewal.renewed_from, None);
        assert_eq!(renewal.reaped, 1);
        assert_eq!(renewal.subscription.expiration_date, later + Duration::days(30));
    }

    #[test]
    fn reaping_sweeps_every_key() {
        let (manager, store) = manager();
        manager.create_or_renew(&order(VIDEO_OFFER, 1, t0()), &partner("b@x.test"), t0()).unwrap();

        let later = t0() + Duration::days(31);
        let renewal = manager
            .create_or_renew(&order(IMAGE_OFFER, 1, later), &partner("a@x.test"), later)
            .unwrap();
        assert_eq!(renewal.reaped, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn blank_email_is_invalid_data() {
        let (manager, store) = manager();
        let err = manager
            .create_or_renew(&order(IMAGE_OFFER, 1, t0()), &partner(""), t0())
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_SUBSCRIPTION_DATA");
        assert!(store.is_empty());
    }

    #[test]
    fn remaining_days_rounds_up() {
        assert_eq!(remaining_days(t0() + Duration::hours(1), t0()), 1);
        assert_eq!(remaining_days(t0() + Duration::days(20), t0()), 20);
        assert_eq!(remaining_days(t0() - Duration::days(2), t0()), 0);
    }

    /// Applies every change in memory but fails to persist it.
    struct FlakyDisk(InMemoryStore<OrderId, Subscription>);

    impl KeyValueStore<OrderId, Subscription> for FlakyDisk {
        fn get(&self, key: &OrderId) -> Result<Option<Subscription>, StoreError> {
            self.0.get(key)
        }

        fn put(&self, key: OrderId, value: Subscription) -> Result<(), StoreError> {
            self.0.put(key, value)?;
            Err(StoreError::Durability("disk full".into()))
        }

        fn delete(&self, key: &OrderId) -> Result<Option<Subscription>, StoreError> {
            self.0.delete(key)?;
            Err(StoreError::Durability("disk full".into()))
        }

        fn scan(&self) -> Result<Vec<(OrderId, Subscription)>, StoreError> {
            self.0.scan()
        }
    }

    #[test]
    fn failed_persistence_degrades_but_keeps_the_subscription() {
        let manager = SubscriptionManager::new(Arc::new(FlakyDisk(InMemoryStore::new())));
        let o = order(IMAGE_OFFER, 1, t0());
        let renewal = manager.create_or_renew(&o, &partner("a@x.test"), t0()).unwrap();
        assert_eq!(renewal.durability, Durability::Degraded);
        assert!(manager.get_by_id(&o.id, t0()).unwrap().is_some());

        let handed = manager
            .order_confirmed(&order(IMAGE_OFFER, 1, t0()), &partner("a@x.test"), t0())
            .unwrap();
        assert!(handed.durability.is_degraded());
        assert_eq!(handed.renewed_from, Some(o.id));
        assert_eq!(manager.list_all(t0()).unwrap().len(), 1);
    }

    #[test]
    fn one_live_subscription_per_key_survives_restart() {
        use adsmarket_infra::SqliteStore;

        let path = std::env::temp_dir()
            .join(format!("adsmarket-subscriptions-{}", OrderId::new()))
            .join("subscriptions.db");
        let open = || {
            let store = SqliteStore::<OrderId, Subscription>::open(&path).unwrap();
            SubscriptionManager::new(Arc::new(store))
        };
        let p = partner("a@x.test");
        let later = t0() + Duration::days(10);
        let second = order(IMAGE_OFFER, 2, later);
        {
            let manager = open();
            manager.create_or_renew(&order(IMAGE_OFFER, 1, t0()), &p, t0()).unwrap();
            let renewal = manager.create_or_renew(&second, &p, later).unwrap();
            assert_eq!(renewal.durability, Durability::Persisted);
        }

        let live = open().list_for_partner("a@x.test", later).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, second.id);
        assert_eq!(live[0].expiration_date, later + Duration::days(50));
    }

    #[test]
    fn concurrent_orders_for_one_key_leave_one_subscription() {
        let (manager, store) = manager();
        let manager = Arc::new(manager);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                std::thread::spawn(move || {
                    manager
                        .create_or_renew(&order(IMAGE_OFFER, 1, t0()), &partner("a@x.test"), t0())
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: renewing `d` days into a term adds exactly the remaining days.
            #[test]
            fn renewal_carries_remaining_days(d in 0i64..30) {
                let (manager, store) = manager();
                let p = partner("a@x.test");
                manager.create_or_renew(&order(IMAGE_OFFER, 1, t0()), &p, t0()).unwrap();

                let later = t0() + Duration::days(d);
                let renewal = manager
                    .create_or_renew(&order(IMAGE_OFFER, 1, later), &p, later)
                    .unwrap();
                prop_assert_eq!(
                    renewal.subscription.expiration_date,
                    later + Duration::days(30 + (30 - d))
                );
                prop_assert_eq!(store.len(), 1);
            }
        }
    }
}
