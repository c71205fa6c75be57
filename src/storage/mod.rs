//! Storage Module
//!
//! This module provides the data side of JunoKV: typed values, the per-database
//! store, the registry of databases and the background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Registry                             │
//! │  ┌───────────────┐ ┌───────────────┐ ┌───────────────┐      │
//! │  │  "0"          │ │  "1"          │ │  ...          │      │
//! │  │  Store        │ │  Store        │ │  created on   │      │
//! │  │  + Sweeper    │ │  + Sweeper    │ │  first select │      │
//! │  └───────────────┘ └───────────────┘ └───────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Typed Values**: a key holds a scalar, a list or a field map, never a mix
//! - **RwLock**: Multiple concurrent readers, exclusive writers per database
//! - **TTL Support**: Keys can expire at an absolute unix time
//! - **Active Expiry**: One background sweeper per database removes elapsed keys
//!
//! ## Example
//!
//! ```
//! use junokv::storage::Store;
//!
//! let store = Store::new("0");
//! store.lset("colors", vec!["red".into(), "green".into()]).unwrap();
//! assert_eq!(store.lget_at("colors", 1).unwrap(), "green");
//!
//! store.expire("colors", 60).unwrap();
//! assert!(store.ttl("colors").unwrap() > 0);
//! ```

pub mod engine;
pub mod error;
pub mod expiry;
pub mod registry;
pub mod value;

// Re-export commonly used types
pub use engine::{Store, StoreStats, NO_EXPIRY};
pub use error::StorageError;
pub use expiry::{sweep_pass, ExpiryConfig, ExpirySweeper, SweepReport};
pub use registry::{Registry, DEFAULT_DB};
pub use value::{unix_now, FieldMap, Kind, Payload, Value};
