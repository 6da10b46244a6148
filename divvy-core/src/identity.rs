//! Identity types for Divvy resources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use thiserror::Error;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Identifier of an item inside a partition (an expense id, a user id, ...).
pub type ItemId = i64;

/// A positive integer identifying a cache partition (a group id or a user id).
///
/// The only way to obtain one is through validation, so every `ResourceKey`
/// in the system is known to be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(NonZeroU64);

impl ResourceKey {
    /// Validate a signed integer as a resource key.
    pub fn new(value: i64) -> Result<Self, InvalidKey> {
        u64::try_from(value)
            .ok()
            .and_then(NonZeroU64::new)
            .map(Self)
            .ok_or_else(|| InvalidKey::new(value))
    }

    /// The key as an unsigned integer.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value that was offered as a resource key but is not a positive integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a positive integer, got {raw}")]
pub struct InvalidKey {
    pub raw: String,
}

impl InvalidKey {
    pub fn new(raw: impl ToString) -> Self {
        Self {
            raw: raw.to_string(),
        }
    }
}

/// Conversion of caller-supplied values into a validated [`ResourceKey`].
///
/// Implemented for integers, floats and strings so that callers holding ids
/// from route parameters or JSON can pass them straight to the cache; the
/// cache rejects anything that is not a positive integer before any I/O.
pub trait IntoResourceKey {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey>;
}

impl IntoResourceKey for ResourceKey {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        Ok(self)
    }
}

impl IntoResourceKey for i64 {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        ResourceKey::new(self)
    }
}

impl IntoResourceKey for i32 {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        ResourceKey::new(i64::from(self))
    }
}

impl IntoResourceKey for u32 {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        ResourceKey::new(i64::from(self))
    }
}

impl IntoResourceKey for u64 {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        NonZeroU64::new(self)
            .map(ResourceKey)
            .ok_or_else(|| InvalidKey::new(self))
    }
}

impl IntoResourceKey for usize {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        (self as u64).into_resource_key()
    }
}

impl IntoResourceKey for f64 {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        // i64::MAX as f64 rounds up, so the bound is exclusive.
        if self.is_finite() && self.fract() == 0.0 && self >= 1.0 && self < i64::MAX as f64 {
            ResourceKey::new(self as i64)
        } else {
            Err(InvalidKey::new(self))
        }
    }
}

impl IntoResourceKey for &str {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        let trimmed = self.trim();
        trimmed
            .parse::<i64>()
            .map_err(|_| InvalidKey::new(format!("{:?}", self)))
            .and_then(ResourceKey::new)
    }
}

impl IntoResourceKey for &String {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        self.as_str().into_resource_key()
    }
}

impl IntoResourceKey for String {
    fn into_resource_key(self) -> Result<ResourceKey, InvalidKey> {
        self.as_str().into_resource_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_positive_integers_are_keys() {
        assert_eq!(ResourceKey::new(1).unwrap().get(), 1);
        assert_eq!(42i32.into_resource_key().unwrap().get(), 42);
        assert_eq!(7u64.into_resource_key().unwrap().get(), 7);
        assert_eq!(3.0f64.into_resource_key().unwrap().get(), 3);
        assert_eq!(" 12 ".into_resource_key().unwrap().get(), 12);
    }

    #[test]
    fn test_non_positive_values_are_rejected() {
        assert_eq!(ResourceKey::new(0).unwrap_err().raw, "0");
        assert_eq!(ResourceKey::new(-1).unwrap_err().raw, "-1");
        assert!(0u64.into_resource_key().is_err());
        assert!(0usize.into_resource_key().is_err());
    }

    #[test]
    fn test_non_integers_are_rejected() {
        assert!(1.5f64.into_resource_key().is_err());
        assert!(f64::NAN.into_resource_key().is_err());
        assert!(f64::INFINITY.into_resource_key().is_err());
        assert!("abc".into_resource_key().is_err());
        assert!("".into_resource_key().is_err());
        assert!("2.5".into_resource_key().is_err());
    }

    #[test]
    fn test_invalid_key_display() {
        let err = ResourceKey::new(-4).unwrap_err();
        assert_eq!(err.to_string(), "expected a positive integer, got -4");
    }

    #[test]
    fn test_keys_order_numerically() {
        let mut keys = vec![
            ResourceKey::new(10).unwrap(),
            ResourceKey::new(2).unwrap(),
            ResourceKey::new(33).unwrap(),
        ];
        keys.sort();
        let raw: Vec<u64> = keys.into_iter().map(ResourceKey::get).collect();
        assert_eq!(raw, vec![2, 10, 33]);
    }

    #[test]
    fn test_key_serializes_as_number() {
        let key = ResourceKey::new(9).unwrap();
        assert_eq!(serde_json::to_value(key).unwrap(), serde_json::json!(9));
    }

    proptest! {
        #[test]
        fn prop_key_validation_matches_sign(value in any::<i64>()) {
            prop_assert_eq!(ResourceKey::new(value).is_ok(), value > 0);
        }
    }
}
