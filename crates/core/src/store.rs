//! Key/value store boundary shared by every service.
//!
//! Services never reach for global maps: each one is handed the stores it
//! needs. Quotes, orders and instances live in an [`InMemoryStore`] for the
//! life of the process; subscriptions go through a durable implementation in
//! `adsmarket-infra`.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::entity::Entity;

/// Store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The operation was not applied (e.g. poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The mutation was applied in memory but could not be made durable.
    ///
    /// Callers must treat the in-memory state as authoritative and report the
    /// degraded durability instead of failing the operation.
    #[error("mutation applied but not persisted: {0}")]
    Durability(String),
}

impl StoreError {
    pub fn is_durability(&self) -> bool {
        matches!(self, StoreError::Durability(_))
    }
}

/// Key/value store with explicit get/put/delete/scan.
pub trait KeyValueStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Result<Option<V>, StoreError>;

    fn put(&self, key: K, value: V) -> Result<(), StoreError>;

    /// Remove a key, returning the previous value if there was one.
    fn delete(&self, key: &K) -> Result<Option<V>, StoreError>;

    /// All entries, ordered by key.
    fn scan(&self) -> Result<Vec<(K, V)>, StoreError>;
}

impl<K, V, S> KeyValueStore<K, V> for Arc<S>
where
    S: KeyValueStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: K, value: V) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &K) -> Result<Option<V>, StoreError> {
        (**self).delete(key)
    }

    fn scan(&self) -> Result<Vec<(K, V)>, StoreError> {
        (**self).scan()
    }
}

/// Convenience for stores keyed by an entity's own id.
pub trait EntityStore<E: Entity>: KeyValueStore<E::Id, E> {
    fn save(&self, entity: E) -> Result<(), StoreError> {
        let id = entity.id().clone();
        self.put(id, entity)
    }
}

impl<E, S> EntityStore<E> for S
where
    E: Entity,
    S: KeyValueStore<E::Id, E> + ?Sized,
{
}

/// In-memory store for process-lifetime records and tests.
#[derive(Debug)]
pub struct InMemoryStore<K, V> {
    inner: RwLock<BTreeMap<K, V>>,
}

impl<K: Ord, V> InMemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            inner: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Ord, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl<K, V> KeyValueStore<K, V> for InMemoryStore<K, V>
where
    K: Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        map.insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &K) -> Result<Option<V>, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        Ok(map.remove(key))
    }

    fn scan(&self) -> Result<Vec<(K, V)>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}
