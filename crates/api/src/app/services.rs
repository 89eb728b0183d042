//! Service wiring: catalog, stores and the ordering/subscription services.

use std::sync::Arc;

use anyhow::Context;

use adsmarket_catalog::Catalog;
use adsmarket_core::{IdentityProvider, InMemoryStore, OrderId};
use adsmarket_infra::{AppConfig, HttpIdentityProvider, SqliteStore};
use adsmarket_ordering::{OrderService, OrderStores, QuoteService};
use adsmarket_subscriptions::{Subscription, SubscriptionManager, SubscriptionStore};

pub struct AppServices {
    pub catalog: Arc<Catalog>,
    pub quotes: QuoteService,
    pub orders: OrderService,
    pub subscriptions: Arc<SubscriptionManager>,
}

impl AppServices {
    pub fn new(
        catalog: Arc<Catalog>,
        subscription_store: SubscriptionStore,
        term_days: u32,
    ) -> Self {
        let stores = OrderStores::in_memory();
        let subscriptions = Arc::new(SubscriptionManager::with_term_days(
            subscription_store,
            term_days,
        ));
        Self {
            quotes: QuoteService::new(catalog.clone(), stores.quotes.clone()),
            orders: OrderService::new(catalog.clone(), stores, subscriptions.clone()),
            catalog,
            subscriptions,
        }
    }

    /// Built-in catalog, nothing on disk. Used by tests and local runs.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(Catalog::marketplace()),
            Arc::new(InMemoryStore::<OrderId, Subscription>::new()),
            adsmarket_subscriptions::DEFAULT_TERM_DAYS,
        )
    }
}

/// Load the catalog and open the subscription database described by `config`.
///
/// Blocks on disk and SQLite; call it from `spawn_blocking`.
pub fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::marketplace(),
    };

    let path = &config.subscriptions_path;
    let store: SqliteStore<OrderId, Subscription> = SqliteStore::open(path)
        .with_context(|| format!("opening subscription store {}", path.display()))?;

    Ok(AppServices::new(
        Arc::new(catalog),
        Arc::new(store),
        config.subscription_term_days,
    ))
}

/// The identity provider, when an auth service is configured.
pub fn build_identity(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn IdentityProvider>>> {
    let Some(url) = &config.auth_service_url else {
        tracing::warn!("AUTH_SERVICE_URL not set; partner identity is taken from request bodies");
        return Ok(None);
    };
    let provider = HttpIdentityProvider::new(url, config.auth_timeout)
        .context("building identity client")?;
    tracing::info!(endpoint = provider.endpoint(), "identity provider configured");
    Ok(Some(Arc::new(provider)))
}
