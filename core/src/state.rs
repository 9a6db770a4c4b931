//! Flat state handed back to the caller after every resource operation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Identifier plus a flat `field name -> scalar` mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceState {
    pub id: String,
    pub attributes: BTreeMap<String, Value>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set one attribute, builder style.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Replace the identifier, keeping the attributes.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let state = ResourceState::new("7")
            .with("name", "P")
            .with("taxonomy_code", 9606)
            .with("unique", true);
        assert_eq!(state.id, "7");
        assert_eq!(state.get_str("name"), Some("P"));
        assert_eq!(state.get_i64("taxonomy_code"), Some(9606));
        assert_eq!(state.get_bool("unique"), Some(true));
        assert_eq!(state.get_str("taxonomy_code"), None);
    }
}
