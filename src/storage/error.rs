//! Errors raised by values and stores.

use thiserror::Error;

/// Errors that can occur while reading or writing a store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The key is not present in the store
    #[error("ERROR: key not exists")]
    KeyNotFound,

    /// The key holds a different kind of value
    #[error("ERROR: types mismatch")]
    TypeMismatch,

    /// The value exists but was never written
    #[error("ERROR: no such item")]
    NoSuchItem,

    /// List index is negative or past the end
    #[error("ERROR: invalid list index")]
    InvalidIndex,

    /// Field is not present in the map
    #[error("ERROR: invalid inner key")]
    InvalidInnerKey,

    /// Non-positive duration or a deadline that is not in the future
    #[error("ERROR: invalid ttl: {0}")]
    InvalidTtl(&'static str),
}
