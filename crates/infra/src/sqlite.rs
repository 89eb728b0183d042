//! Durable key/value store on SQLite, one row per key.
//!
//! Reads are served from an in-memory copy loaded at open. Every write runs
//! in its own SQLite transaction. A write that fails to commit stays pending
//! and is committed together with the next write, so a later acknowledged
//! write never lands on disk without the earlier ones.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tokio::runtime::Runtime;

use adsmarket_core::{KeyValueStore, StoreError};

#[derive(Debug, Error)]
pub enum SqliteStoreError {
    #[error("cannot create directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start store runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("sqlite error on {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("row {key} in {path} does not decode: {reason}")]
    Corrupt { path: PathBuf, key: String, reason: String },
}

struct State<K, V> {
    map: BTreeMap<K, V>,
    /// Keys whose current in-memory state has not been committed yet.
    pending: BTreeSet<K>,
}

pub struct SqliteStore<K, V> {
    path: PathBuf,
    pool: SqlitePool,
    /// Dedicated runtime so the store can be driven from synchronous code.
    runtime: Option<Runtime>,
    state: RwLock<State<K, V>>,
}

impl<K, V> SqliteStore<K, V>
where
    K: Clone + Ord + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Open (or create) the database at `path` and load every row.
    ///
    /// Must not be called from inside an async task; use `spawn_blocking`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| SqliteStoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SqliteStoreError::Runtime)?;
        let db_err = |source: sqlx::Error| SqliteStoreError::Database {
            path: path.clone(),
            source,
        };

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);
        // One connection: writes are serialized by the store anyway.
        let pool = runtime
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options),
            )
            .map_err(db_err)?;

        let rows = runtime
            .block_on(async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS entries (
                        key   TEXT PRIMARY KEY NOT NULL,
                        value TEXT NOT NULL
                    )
                    "#,
                )
                .execute(&pool)
                .await?;
                sqlx::query("SELECT key, value FROM entries").fetch_all(&pool).await
            })
            .map_err(db_err)?;

        let mut map = BTreeMap::new();
        for row in rows {
            let key: String = row.try_get("key").map_err(db_err)?;
            let value: String = row.try_get("value").map_err(db_err)?;
            let corrupt = |e: serde_json::Error| SqliteStoreError::Corrupt {
                path: path.clone(),
                key: key.clone(),
                reason: e.to_string(),
            };
            map.insert(
                serde_json::from_str(&key).map_err(corrupt)?,
                serde_json::from_str(&value).map_err(corrupt)?,
            );
        }
        tracing::info!(path = %path.display(), entries = map.len(), "sqlite store opened");

        Ok(Self {
            path,
            pool,
            runtime: Some(runtime),
            state: RwLock::new(State {
                map,
                pending: BTreeSet::new(),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys changed in memory but not yet committed.
    pub fn pending(&self) -> usize {
        self.state.read().map(|s| s.pending.len()).unwrap_or(0)
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output, StoreError> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("store runtime shut down".into()))?;
        Ok(runtime.block_on(future))
    }

    /// Commit the current value of every pending key in one transaction.
    fn flush(&self, state: &mut State<K, V>) -> Result<(), StoreError> {
        let encode = |e: serde_json::Error| StoreError::Durability(e.to_string());
        let mut rows = Vec::with_capacity(state.pending.len());
        for key in &state.pending {
            let encoded_key = serde_json::to_string(key).map_err(encode)?;
            let encoded_value = match state.map.get(key) {
                Some(value) => Some(serde_json::to_string(value).map_err(encode)?),
                None => None,
            };
            rows.push((encoded_key, encoded_value));
        }

        self.block_on(write_rows(&self.pool, &rows))?
            .map_err(|e| StoreError::Durability(format!("{}: {e}", self.path.display())))?;
        state.pending.clear();
        Ok(())
    }

    #[cfg(test)]
    fn fail_writes(&self, on: bool) {
        let pragma = if on {
            "PRAGMA query_only = ON"
        } else {
            "PRAGMA query_only = OFF"
        };
        self.block_on(sqlx::query(pragma).execute(&self.pool))
            .unwrap()
            .unwrap();
    }
}

async fn write_rows(
    pool: &SqlitePool,
    rows: &[(String, Option<String>)],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for (key, value) in rows {
        match value {
            Some(value) => {
                sqlx::query(
                    "INSERT INTO entries (key, value) VALUES (?1, ?2) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                )
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM entries WHERE key = ?1")
                    .bind(key)
                    .execute(&mut *tx)
                    .await?;
            }
        }
    }
    tx.commit().await
}

impl<K, V> KeyValueStore<K, V> for SqliteStore<K, V>
where
    K: Clone + Ord + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.map.get(key).cloned())
    }

    fn put(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.map.insert(key.clone(), value);
        state.pending.insert(key);
        self.flush(&mut state)
    }

    fn delete(&self, key: &K) -> Result<Option<V>, StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let Some(previous) = state.map.remove(key) else {
            return Ok(None);
        };
        state.pending.insert(key.clone());
        self.flush(&mut state)?;
        Ok(Some(previous))
    }

    fn scan(&self) -> Result<Vec<(K, V)>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl<K, V> Drop for SqliteStore<K, V> {
    fn drop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        // Closing blocks, which is only allowed outside async tasks.
        if tokio::runtime::Handle::try_current().is_err() {
            runtime.block_on(self.pool.close());
        }
        runtime.shutdown_background();
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Unavailable("sqlite store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use adsmarket_catalog::marketplace::IMAGE_OFFER;
    use adsmarket_core::{Money, OrderId, OrderStatus, PartnerIdentity};
    use adsmarket_ordering::{
        Billing, Durability, Order, OrderPartner, ProvisionedOffering, Selection,
    };
    use adsmarket_subscriptions::{Subscription, SubscriptionManager};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn temp_db() -> PathBuf {
        std::env::temp_dir()
            .join(format!("adsmarket-store-{}", uuid::Uuid::now_v7()))
            .join("store.db")
    }

    fn open(path: &Path) -> SqliteStore<String, u32> {
        SqliteStore::open(path).unwrap()
    }

    #[test]
    fn changes_survive_reopen() {
        let path = temp_db();
        {
            let store = open(&path);
            store.put("a".into(), 1).unwrap();
            store.put("b".into(), 2).unwrap();
            store.put("a".into(), 3).unwrap();
            assert_eq!(store.delete(&"b".to_string()).unwrap(), Some(2));
        }

        let store = open(&path);
        assert_eq!(store.scan().unwrap(), vec![("a".to_string(), 3)]);
    }

    #[test]
    fn deleting_a_missing_key_is_a_no_op() {
        let store = open(&temp_db());
        assert_eq!(store.delete(&"nope".to_string()).unwrap(), None);
        assert!(store.is_empty());
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn scan_is_ordered_by_key() {
        let path = temp_db();
        {
            let store: SqliteStore<u32, String> = SqliteStore::open(&path).unwrap();
            for i in [5, 1, 3] {
                store.put(i, format!("v{i}")).unwrap();
            }
        }
        let store: SqliteStore<u32, String> = SqliteStore::open(&path).unwrap();
        let keys: Vec<u32> = store.scan().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn failed_write_is_committed_by_the_next_one() {
        let path = temp_db();
        {
            let store = open(&path);
            store.fail_writes(true);
            let err = store.put("first".into(), 1).unwrap_err();
            assert!(err.is_durability());
            // Applied in memory regardless.
            assert_eq!(store.get(&"first".to_string()).unwrap(), Some(1));
            assert_eq!(store.pending(), 1);

            store.fail_writes(false);
            store.put("second".into(), 2).unwrap();
            assert_eq!(store.pending(), 0);
        }

        let store = open(&path);
        assert_eq!(
            store.scan().unwrap(),
            vec![("first".to_string(), 1), ("second".to_string(), 2)]
        );
    }

    #[test]
    fn failed_delete_followed_by_a_put_leaves_only_the_put() {
        let path = temp_db();
        {
            let store = open(&path);
            store.put("old".into(), 1).unwrap();

            store.fail_writes(true);
            assert!(store.delete(&"old".to_string()).unwrap_err().is_durability());
            store.fail_writes(false);

            store.put("new".into(), 2).unwrap();
        }

        let store = open(&path);
        assert_eq!(store.scan().unwrap(), vec![("new".to_string(), 2)]);
    }

    #[test]
    fn undecodable_rows_fail_open() {
        let path = temp_db();
        {
            let store = open(&path);
            store.put("a".into(), 1).unwrap();
        }
        let err = SqliteStore::<String, String>::open(&path).err().unwrap();
        assert!(matches!(err, SqliteStoreError::Corrupt { .. }));
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn image_order(at: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(),
            quote_id: None,
            partner: OrderPartner {
                email: "a@x.test".into(),
                company_name: None,
            },
            offering: ProvisionedOffering {
                id: IMAGE_OFFER.into(),
                images_count: Some(1),
                videos_count: None,
                models_count: None,
                count: None,
            },
            selections: vec![Selection::new(IMAGE_OFFER).with_images(1)],
            status: OrderStatus::Confirmed,
            created_at: at,
            instances: vec![],
            billing: Billing {
                total: Money::new(1_000, "EUR"),
                lines: vec![],
            },
        }
    }

    /// Fails the commit of the next delete, then lets writes through again.
    struct DeleteFailsOnce {
        inner: SqliteStore<OrderId, Subscription>,
        armed: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore<OrderId, Subscription> for DeleteFailsOnce {
        fn get(&self, key: &OrderId) -> Result<Option<Subscription>, StoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: OrderId, value: Subscription) -> Result<(), StoreError> {
            self.inner.put(key, value)
        }

        fn delete(&self, key: &OrderId) -> Result<Option<Subscription>, StoreError> {
            let armed = self.armed.swap(false, std::sync::atomic::Ordering::SeqCst);
            if armed {
                self.inner.fail_writes(true);
            }
            let result = self.inner.delete(key);
            if armed {
                self.inner.fail_writes(false);
            }
            result
        }

        fn scan(&self) -> Result<Vec<(OrderId, Subscription)>, StoreError> {
            self.inner.scan()
        }
    }

    #[test]
    fn renewal_with_an_uncommitted_delete_keeps_one_subscription_after_restart() {
        let path = temp_db();
        let partner = PartnerIdentity::new("a@x.test", None);
        let later = t0() + Duration::days(5);
        let second = image_order(later);
        {
            let store = Arc::new(DeleteFailsOnce {
                inner: SqliteStore::open(&path).unwrap(),
                armed: std::sync::atomic::AtomicBool::new(false),
            });
            let manager = SubscriptionManager::new(store.clone());
            manager.create_or_renew(&image_order(t0()), &partner, t0()).unwrap();

            store.armed.store(true, std::sync::atomic::Ordering::SeqCst);
            let renewal = manager.create_or_renew(&second, &partner, later).unwrap();
            assert_eq!(renewal.durability, Durability::Degraded);
            assert_eq!(store.inner.pending(), 0);
        }

        let manager = SubscriptionManager::new(Arc::new(
            SqliteStore::<OrderId, Subscription>::open(&path).unwrap(),
        ));
        let live = manager.list_for_partner("a@x.test", later).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, second.id);
    }
}
