//! Thread-Safe Store
//!
//! A [`Store`] is one logical database: a map from key to [`Value`] behind a
//! single `RwLock`.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  Store "0"                  │
//! │  ┌───────────────────────────────────────┐  │
//! │  │  RwLock<HashMap<String, Value>>       │  │
//! │  └───────────────────────────────────────┘  │
//! └─────────────────────────────────────────────┘
//!        ▲ read: get*, keys, ttl
//!        ▲ write: set*, *update, remove, expire*, persist
//! ```
//!
//! The lock is coarse: writes to unrelated keys serialize against each other.
//! In-place list and map updates happen under the write lock, so a reader
//! never observes a half-applied update.

use crate::storage::error::StorageError;
use crate::storage::value::{unix_now, FieldMap, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reply of [`Store::ttl`] for keys that never expire.
pub const NO_EXPIRY: i64 = -1;

/// One logical database.
///
/// Designed to be wrapped in an `Arc` and shared between every connection
/// that selected it and the database's expiry sweeper.
///
/// # Example
///
/// ```
/// use junokv::storage::Store;
///
/// let store = Store::new("0");
/// store.set("name", "John Doe".to_string()).unwrap();
/// assert_eq!(store.get("name").unwrap(), "John Doe");
/// assert_eq!(store.ttl("name").unwrap(), junokv::storage::NO_EXPIRY);
/// ```
pub struct Store {
    /// Database identifier (for logging)
    id: String,

    keys: RwLock<HashMap<String, Value>>,

    /// Statistics: read operations served
    read_count: AtomicU64,

    /// Statistics: write operations applied
    write_count: AtomicU64,

    /// Statistics: keys removed by the sweeper
    expired_count: AtomicU64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("keys", &self.len())
            .finish()
    }
}

impl Store {
    /// Creates an empty store for the given database id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keys: RwLock::new(HashMap::new()),
            read_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.keys.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the value at `key` under the read lock.
    fn with_value<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Value) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let keys = self.read();
        let value = keys.get(key).ok_or(StorageError::KeyNotFound)?;
        f(value)
    }

    /// Runs `f` against the value at `key` under the write lock.
    fn with_value_mut<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Value) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut keys = self.write();
        let value = keys.get_mut(key).ok_or(StorageError::KeyNotFound)?;
        f(value)
    }

    /// Runs `f` against the value at `key`, creating an unset value first if
    /// the key is absent.
    fn upsert(
        &self,
        key: &str,
        f: impl FnOnce(&mut Value) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        let mut keys = self.write();
        match keys.get_mut(key) {
            Some(value) => f(value),
            None => {
                let mut value = Value::new();
                f(&mut value)?;
                keys.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    // ========================================================================
    // SCALAR OPERATIONS
    // ========================================================================

    /// Stores a scalar. Fails with `TypeMismatch` if the key holds another kind.
    ///
    /// An existing deadline on the key is kept.
    pub fn set(&self, key: &str, s: String) -> Result<(), StorageError> {
        self.upsert(key, |value| value.set_scalar(s))
    }

    pub fn get(&self, key: &str) -> Result<String, StorageError> {
        self.with_value(key, |value| value.get_scalar().map(str::to_string))
    }

    // ========================================================================
    // LIST OPERATIONS
    // ========================================================================

    /// Stores (or replaces) the whole list at `key`.
    pub fn lset(&self, key: &str, items: Vec<String>) -> Result<(), StorageError> {
        self.upsert(key, |value| value.set_list(items))
    }

    pub fn lget(&self, key: &str) -> Result<Vec<String>, StorageError> {
        self.with_value(key, |value| value.get_list().map(<[String]>::to_vec))
    }

    /// Returns the list element at `index`.
    pub fn lget_at(&self, key: &str, index: i64) -> Result<String, StorageError> {
        self.with_value(key, |value| {
            let items = value.get_list()?;
            let i = checked_index(index, items.len())?;
            Ok(items[i].clone())
        })
    }

    /// Replaces the list element at `index` in place.
    pub fn lupdate(&self, key: &str, index: i64, item: String) -> Result<(), StorageError> {
        self.with_value_mut(key, |value| {
            let items = value.list_mut()?;
            let i = checked_index(index, items.len())?;
            items[i] = item;
            Ok(())
        })
    }

    // ========================================================================
    // MAP OPERATIONS
    // ========================================================================

    /// Stores (or replaces) the whole field map at `key`.
    pub fn hset(&self, key: &str, dict: FieldMap) -> Result<(), StorageError> {
        self.upsert(key, |value| value.set_map(dict))
    }

    pub fn hget(&self, key: &str) -> Result<FieldMap, StorageError> {
        self.with_value(key, |value| value.get_map().cloned())
    }

    /// Returns a single field of the map at `key`.
    pub fn hget_field(&self, key: &str, field: &str) -> Result<String, StorageError> {
        self.with_value(key, |value| {
            value
                .get_map()?
                .get(field)
                .cloned()
                .ok_or(StorageError::InvalidInnerKey)
        })
    }

    /// Inserts or overwrites one field, leaving the other fields alone.
    pub fn hupdate(&self, key: &str, field: String, item: String) -> Result<(), StorageError> {
        self.with_value_mut(key, |value| {
            value.map_mut()?.insert(field, item);
            Ok(())
        })
    }

    // ========================================================================
    // KEY OPERATIONS
    // ========================================================================

    /// Returns every key currently stored, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Deletes a key.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key existed. Absent keys are not an error.
    pub fn remove(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Sets the key to expire `seconds` from now.
    pub fn expire(&self, key: &str, seconds: i64) -> Result<(), StorageError> {
        if seconds <= 0 {
            return Err(StorageError::InvalidTtl("duration must be positive"));
        }
        let deadline = unix_now().saturating_add(seconds);
        self.with_value_mut(key, |value| {
            value.set_ttl(Some(deadline));
            Ok(())
        })
    }

    /// Sets the key to expire at the absolute unix time `timestamp`.
    pub fn expire_at(&self, key: &str, timestamp: i64) -> Result<(), StorageError> {
        if timestamp <= unix_now() {
            return Err(StorageError::InvalidTtl("timestamp must be in the future"));
        }
        self.with_value_mut(key, |value| {
            value.set_ttl(Some(timestamp));
            Ok(())
        })
    }

    /// Removes the expiry from a key.
    pub fn persist(&self, key: &str) -> Result<(), StorageError> {
        self.with_value_mut(key, |value| {
            value.set_ttl(None);
            Ok(())
        })
    }

    /// Gets the remaining TTL for a key in seconds.
    ///
    /// # Returns
    ///
    /// - `Ok(seconds)` if the key has an expiry (0 once the deadline passed)
    /// - `Ok(NO_EXPIRY)` if the key exists but never expires
    /// - `Err(KeyNotFound)` if the key doesn't exist
    pub fn ttl(&self, key: &str) -> Result<i64, StorageError> {
        let deadline = self.deadline(key)?;
        Ok(deadline
            .map(|exp| exp.saturating_sub(unix_now()).max(0))
            .unwrap_or(NO_EXPIRY))
    }

    /// Returns the raw absolute deadline stored for `key`.
    pub fn deadline(&self, key: &str) -> Result<Option<i64>, StorageError> {
        self.with_value(key, |value| Ok(value.ttl()))
    }

    /// Removes `key` if its deadline has been reached at `now`.
    ///
    /// The check and the removal happen under one write lock, so a concurrent
    /// `persist` or `expire` is never overridden.
    pub fn remove_if_expired(&self, key: &str, now: i64) -> bool {
        let mut keys = self.write();
        let expired = keys.get(key).is_some_and(|v| v.is_expired_at(now));
        if expired {
            keys.remove(key);
            self.expired_count.fetch_add(1, Ordering::Relaxed);
        }
        expired
    }

    /// Returns the number of keys in the store.
    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len(),
            reads: self.read_count.load(Ordering::Relaxed),
            writes: self.write_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    pub(crate) fn force_deadline(&self, key: &str, deadline: Option<i64>) {
        if let Some(value) = self.write().get_mut(key) {
            value.set_ttl(deadline);
        }
    }
}

/// Bound-checks a list index.
fn checked_index(index: i64, len: usize) -> Result<usize, StorageError> {
    if index < 0 || index as u64 >= len as u64 {
        return Err(StorageError::InvalidIndex);
    }
    Ok(index as usize)
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of keys currently stored
    pub keys: usize,
    /// Operations that took the read lock
    pub reads: u64,
    /// Operations that took the write lock
    pub writes: u64,
    /// Keys removed because their TTL elapsed
    pub expired: u64,
}
