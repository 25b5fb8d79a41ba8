//! # Event Payloads
//!
//! A [`Payload`] is an immutable, ordered `String -> Value` map shared between every copy
//! of an event. Adding keys goes through [`Payload::apply`], which builds a new map and
//! leaves the original untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

type Values = BTreeMap<String, Value>;

/// Immutable keyed payload of an [`Event`](crate::Event).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Arc<Values>);

impl Payload {
    /// An empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value of `key` when it holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns a new payload with `values` merged over this one.
    pub fn apply<I, K, V>(&self, values: I) -> Payload
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut merged = (*self.0).clone();
        for (key, value) in values {
            merged.insert(key.into(), value.into());
        }
        Self(Arc::new(merged))
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self(Arc::new(values))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_leaves_original_untouched() {
        let original = Payload::from_iter([("room", "room:school:cafeteria"), ("message", "hi")]);
        let extended = original.apply([("from", "user:bart")]);

        assert_eq!(original.len(), 2);
        assert!(!original.contains_key("from"));
        assert_eq!(extended.get_str("from"), Some("user:bart"));
        assert_eq!(extended.get_str("message"), Some("hi"));
    }

    #[test]
    fn apply_overrides_existing_keys() {
        let original = Payload::from_iter([("from", "user:lisa")]);
        let spoofed = original.apply([("from", "user:bart")]);
        assert_eq!(original.get_str("from"), Some("user:lisa"));
        assert_eq!(spoofed.get_str("from"), Some("user:bart"));
    }

    #[test]
    fn serializes_as_object() {
        let payload = Payload::from_iter([("from", "user:bart"), ("message", "hello")]);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"from": "user:bart", "message": "hello"}));
    }
}
