//! Typed vendor extensions recognized on operations and at the document root.
//!
//! Only `x-rate-limit`, `x-cache` and `x-retry` are modelled. They are parsed
//! once with the document. A value that does not fit its shape is kept as
//! written in [`Extension::Invalid`] and reported by validation, so one bad
//! extension never fails the whole load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A recognized extension as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension<T> {
    Valid(T),
    Invalid { raw: Value, error: String },
}

impl<T> Extension<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Extension::Valid(value) => Some(value),
            Extension::Invalid { .. } => None,
        }
    }

    /// Why the value was rejected, if it was.
    pub fn error(&self) -> Option<&str> {
        match self {
            Extension::Valid(_) => None,
            Extension::Invalid { error, .. } => Some(error),
        }
    }
}

impl<T> From<T> for Extension<T> {
    fn from(value: T) -> Self {
        Extension::Valid(value)
    }
}

impl<T: Serialize> Serialize for Extension<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Extension::Valid(value) => value.serialize(serializer),
            Extension::Invalid { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Extension<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(match serde_json::from_value::<T>(raw.clone()) {
            Ok(value) => Extension::Valid(value),
            Err(e) => Extension::Invalid {
                raw,
                error: e.to_string(),
            },
        })
    }
}

/// `x-rate-limit`: request quota for an operation (or the whole document).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests allowed per window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<u64>,

    /// Window length, e.g. `1m` or `1h`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
}

/// `x-cache`: response caching hints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Time to live in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vary: Vec<String>,
}

/// Backoff shape used between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    Fixed,
    Linear,
    Exponential,
}

/// `x-retry`: client retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(rename = "maxAttempts", skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<Backoff>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_extension_is_typed() {
        let ext: Extension<RetryPolicy> =
            serde_yaml_ng::from_str("{maxAttempts: 3, backoff: linear}").unwrap();
        let policy = ext.valid().unwrap();
        assert_eq!(policy.max_attempts, Some(3));
        assert_eq!(policy.backoff, Some(Backoff::Linear));
    }

    #[test]
    fn test_malformed_extension_keeps_raw_value() {
        let ext: Extension<RetryPolicy> = serde_yaml_ng::from_str("{backoff: jittered}").unwrap();
        assert!(ext.valid().is_none());
        assert!(ext.error().unwrap().contains("jittered"));

        let back = serde_yaml_ng::to_string(&ext).unwrap();
        assert_eq!(back.trim(), "backoff: jittered");
    }

    #[test]
    fn test_scalar_where_object_expected() {
        let ext: Extension<RateLimit> = serde_yaml_ng::from_str("100").unwrap();
        assert!(matches!(ext, Extension::Invalid { raw: Value::Number(_), .. }));
    }
}
