//! Typed Value Container
//!
//! Every key in a [`Store`](crate::storage::Store) addresses exactly one
//! [`Value`]. A value starts out [`Kind::Unset`] and takes on a kind with its
//! first write. From then on only writes of the same kind are accepted until
//! the owning key is removed.
//!
//! ```text
//!            SetScalar / SetList / SetMap
//!   Unset ─────────────────────────────────> Scalar | List | Map
//!                                               │
//!                                               └── same-kind writes only
//! ```

use crate::storage::error::StorageError;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Field map stored under a single key.
pub type FieldMap = BTreeMap<String, String>;

/// Returns the current unix time in whole seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// The shape of the data held by a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Unset,
    Scalar,
    List,
    Map,
}

/// The data held by a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    Unset,
    Scalar(String),
    List(Vec<String>),
    Map(FieldMap),
}

impl Payload {
    fn kind(&self) -> Kind {
        match self {
            Payload::Unset => Kind::Unset,
            Payload::Scalar(_) => Kind::Scalar,
            Payload::List(_) => Kind::List,
            Payload::Map(_) => Kind::Map,
        }
    }
}

/// A stored value together with its expiry deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    payload: Payload,
    /// Absolute unix time in seconds (None = never expires)
    expires_at: Option<i64>,
}

impl Value {
    /// Creates an unset value without expiry.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Fails with `TypeMismatch` unless the value is unset or already `target`.
    fn check_writable(&self, target: Kind) -> Result<(), StorageError> {
        match self.kind() {
            Kind::Unset => Ok(()),
            kind if kind == target => Ok(()),
            _ => Err(StorageError::TypeMismatch),
        }
    }

    pub fn set_scalar(&mut self, s: String) -> Result<(), StorageError> {
        self.check_writable(Kind::Scalar)?;
        self.payload = Payload::Scalar(s);
        Ok(())
    }

    pub fn get_scalar(&self) -> Result<&str, StorageError> {
        match &self.payload {
            Payload::Unset => Err(StorageError::NoSuchItem),
            Payload::Scalar(s) => Ok(s),
            _ => Err(StorageError::TypeMismatch),
        }
    }

    pub fn set_list(&mut self, items: Vec<String>) -> Result<(), StorageError> {
        self.check_writable(Kind::List)?;
        self.payload = Payload::List(items);
        Ok(())
    }

    pub fn get_list(&self) -> Result<&[String], StorageError> {
        match &self.payload {
            Payload::Unset => Err(StorageError::NoSuchItem),
            Payload::List(items) => Ok(items),
            _ => Err(StorageError::TypeMismatch),
        }
    }

    /// Mutable access to the list for in-place updates.
    pub fn list_mut(&mut self) -> Result<&mut Vec<String>, StorageError> {
        match &mut self.payload {
            Payload::Unset => Err(StorageError::NoSuchItem),
            Payload::List(items) => Ok(items),
            _ => Err(StorageError::TypeMismatch),
        }
    }

    pub fn set_map(&mut self, dict: FieldMap) -> Result<(), StorageError> {
        self.check_writable(Kind::Map)?;
        self.payload = Payload::Map(dict);
        Ok(())
    }

    pub fn get_map(&self) -> Result<&FieldMap, StorageError> {
        match &self.payload {
            Payload::Unset => Err(StorageError::NoSuchItem),
            Payload::Map(dict) => Ok(dict),
            _ => Err(StorageError::TypeMismatch),
        }
    }

    /// Mutable access to the field map for in-place updates.
    pub fn map_mut(&mut self) -> Result<&mut FieldMap, StorageError> {
        match &mut self.payload {
            Payload::Unset => Err(StorageError::NoSuchItem),
            Payload::Map(dict) => Ok(dict),
            _ => Err(StorageError::TypeMismatch),
        }
    }

    /// Returns the absolute expiry deadline, if any.
    #[inline]
    pub fn ttl(&self) -> Option<i64> {
        self.expires_at
    }

    /// Sets (or clears with `None`) the absolute expiry deadline.
    ///
    /// A deadline of `0` means no expiration and is stored as `None`.
    #[inline]
    pub fn set_ttl(&mut self, deadline: Option<i64>) {
        self.expires_at = deadline.filter(|&t| t != 0);
    }

    /// Checks if the deadline has been reached at `now`.
    #[inline]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_value_reports_no_item() {
        let value = Value::new();
        assert_eq!(value.kind(), Kind::Unset);
        assert_eq!(value.get_scalar(), Err(StorageError::NoSuchItem));
        assert_eq!(value.get_list(), Err(StorageError::NoSuchItem));
        assert_eq!(value.get_map(), Err(StorageError::NoSuchItem));
    }

    #[test]
    fn test_scalar_overwrite() {
        let mut value = Value::new();
        value.set_scalar("one".into()).unwrap();
        value.set_scalar("two".into()).unwrap();
        assert_eq!(value.kind(), Kind::Scalar);
        assert_eq!(value.get_scalar(), Ok("two"));
        assert_eq!(value.payload(), &Payload::Scalar("two".to_string()));
    }

    #[test]
    fn test_kind_is_sticky() {
        let mut value = Value::new();
        value
            .set_list(vec!["a".to_string(), "b".to_string()])
            .unwrap();

        assert_eq!(value.set_scalar("x".into()), Err(StorageError::TypeMismatch));
        assert_eq!(
            value.set_map(FieldMap::from([("f".to_string(), "v".to_string())])),
            Err(StorageError::TypeMismatch)
        );

        // The list survives the rejected writes
        assert_eq!(value.get_list().unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_accessor_mismatch() {
        let mut value = Value::new();
        value.set_scalar("text".into()).unwrap();

        assert_eq!(value.get_list(), Err(StorageError::TypeMismatch));
        assert_eq!(value.get_map(), Err(StorageError::TypeMismatch));
        assert!(value.list_mut().is_err());
        assert!(value.map_mut().is_err());
    }

    #[test]
    fn test_in_place_map_update() {
        let mut value = Value::new();
        value
            .set_map(FieldMap::from([("age".to_string(), "30".to_string())]))
            .unwrap();

        value
            .map_mut()
            .unwrap()
            .insert("city".to_string(), "NYC".to_string());

        let dict = value.get_map().unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict["age"], "30");
        assert_eq!(dict["city"], "NYC");
    }

    #[test]
    fn test_ttl_accessors() {
        let mut value = Value::new();
        assert_eq!(value.ttl(), None);
        assert!(!value.is_expired_at(i64::MAX));

        value.set_ttl(Some(100));
        assert_eq!(value.ttl(), Some(100));
        assert!(!value.is_expired_at(99));
        assert!(value.is_expired_at(100));

        value.set_ttl(None);
        assert!(!value.is_expired_at(1_000));
    }

    #[test]
    fn test_zero_ttl_means_no_expiry() {
        let mut value = Value::new();
        value.set_ttl(Some(100));
        value.set_ttl(Some(0));

        assert_eq!(value.ttl(), None);
        assert!(!value.is_expired_at(i64::MAX));
    }
}
