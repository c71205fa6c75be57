//! Database Registry
//!
//! The [`Registry`] maps database ids to their [`Store`]s. Stores are created
//! lazily the first time an id is selected and live until the process exits.
//! Every store is paired with exactly one [`ExpirySweeper`], except stores
//! created after [`Registry::shutdown`], which get none.
//!
//! ```text
//!   select "3"
//!       │
//!       ▼
//! ┌──────────────┐  read lock hit   ┌─────────────┐
//! │ get_or_create│ ───────────────> │ Arc<Store>  │
//! └──────┬───────┘                  └─────────────┘
//!        │ miss: write lock, re-check, insert + start sweeper
//!        ▼
//! ┌──────────────────────────────┐
//! │ Database { store, sweeper }  │
//! └──────────────────────────────┘
//! ```

use crate::storage::engine::Store;
use crate::storage::expiry::{ExpiryConfig, ExpirySweeper};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Id of the database every connection starts on.
pub const DEFAULT_DB: &str = "0";

/// A store and the sweeper that keeps it free of expired keys.
#[derive(Debug)]
struct Database {
    store: Arc<Store>,
    /// `None` once the registry has shut down
    sweeper: Option<ExpirySweeper>,
}

/// Owns every database of the process.
///
/// # Example
///
/// ```ignore
/// use junokv::storage::{ExpiryConfig, Registry, DEFAULT_DB};
///
/// let registry = Registry::new(ExpiryConfig::default());
/// let db0 = registry.get_or_create(DEFAULT_DB);
/// let db3 = registry.get_or_create("3");
/// ```
#[derive(Debug)]
pub struct Registry {
    databases: RwLock<HashMap<String, Database>>,

    /// Configuration handed to every sweeper
    config: ExpiryConfig,

    /// Statistics: sweepers started over the registry's lifetime
    sweepers_started: AtomicUsize,

    /// Set by `shutdown`; written under the `databases` write lock
    shut_down: AtomicBool,
}

impl Registry {
    /// Creates a registry holding only the default database.
    ///
    /// Must be called from within a Tokio runtime, since it starts the default
    /// database's sweeper.
    pub fn new(config: ExpiryConfig) -> Self {
        let registry = Self {
            databases: RwLock::new(HashMap::new()),
            config,
            sweepers_started: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
        };
        registry.get_or_create(DEFAULT_DB);
        registry
    }

    /// Returns the store for `id`, creating it and starting its sweeper if
    /// this is the first time `id` is seen.
    ///
    /// Concurrent first calls for the same id produce one store and one
    /// sweeper: creation happens under the write lock after re-checking.
    pub fn get_or_create(&self, id: &str) -> Arc<Store> {
        if let Some(store) = self.get(id) {
            return store;
        }

        let mut databases = self
            .databases
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match databases.entry(id.to_string()) {
            Entry::Occupied(entry) => Arc::clone(&entry.get().store),
            Entry::Vacant(entry) => {
                let store = Arc::new(Store::new(id));
                let sweeper = if self.shut_down.load(Ordering::Acquire) {
                    warn!(db = %id, "Database created after shutdown, no expiry sweeper");
                    None
                } else {
                    self.sweepers_started.fetch_add(1, Ordering::Relaxed);
                    Some(ExpirySweeper::start(Arc::clone(&store), self.config.clone()))
                };
                info!(db = %id, "Database created");

                entry.insert(Database {
                    store: Arc::clone(&store),
                    sweeper,
                });
                store
            }
        }
    }

    /// Returns the store for `id` if it already exists.
    pub fn get(&self, id: &str) -> Option<Arc<Store>> {
        self.databases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|db| Arc::clone(&db.store))
    }

    /// Returns the ids of every database created so far.
    pub fn ids(&self) -> Vec<String> {
        self.databases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Returns the number of databases.
    pub fn len(&self) -> usize {
        self.databases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many sweepers this registry has started.
    pub fn sweepers_started(&self) -> usize {
        self.sweepers_started.load(Ordering::Relaxed)
    }

    /// Returns how many sweepers are still running.
    pub fn sweepers_running(&self) -> usize {
        self.databases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|db| db.sweeper.as_ref().is_some_and(ExpirySweeper::is_running))
            .count()
    }

    /// Signals every sweeper to stop. Stores stay readable, and databases
    /// created from now on start without a sweeper.
    pub fn shutdown(&self) {
        let databases = self
            .databases
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.shut_down.store(true, Ordering::Release);
        for sweeper in databases.values().filter_map(|db| db.sweeper.as_ref()) {
            sweeper.stop();
        }
        info!(databases = databases.len(), "Expiry sweepers stopped");
    }
}
