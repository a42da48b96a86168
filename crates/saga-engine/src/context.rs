use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The shared, append-only-by-convention data bag a saga's steps read from
/// and write to.
///
/// Deliberately untyped (a JSON object) so the engine stays generic over any
/// step list; `order-saga` layers a typed accessor on top of the same
/// storage rather than the engine interpreting keys itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SagaContext(Map<String, Value>);

impl SagaContext {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Shallow-merges `fragment` into this context, overwriting any keys
    /// it shares with the existing data.
    pub fn merge(&mut self, fragment: Map<String, Value>) {
        for (key, value) in fragment {
            self.0.insert(key, value);
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Value> for SagaContext {
    /// Builds a context from a JSON value; a non-object value becomes an
    /// empty context rather than panicking.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_shared_keys() {
        let mut context = SagaContext::new();
        context.insert("order_id", json!("o-1"));
        context.insert("reservation_id", json!("r-1"));

        let mut fragment = Map::new();
        fragment.insert("reservation_id".to_string(), json!("r-2"));
        fragment.insert("payment_id".to_string(), json!("p-1"));
        context.merge(fragment);

        assert_eq!(context.get("order_id"), Some(&json!("o-1")));
        assert_eq!(context.get("reservation_id"), Some(&json!("r-2")));
        assert_eq!(context.get("payment_id"), Some(&json!("p-1")));
    }

    #[test]
    fn non_object_value_becomes_empty_context() {
        let context = SagaContext::from(json!([1, 2, 3]));
        assert!(context.as_map().is_empty());
    }

    #[test]
    fn roundtrips_through_serde() {
        let mut context = SagaContext::new();
        context.insert("order_id", json!("o-1"));
        let encoded = serde_json::to_string(&context).unwrap();
        let decoded: SagaContext = serde_json::from_str(&encoded).unwrap();
        assert_eq!(context, decoded);
    }
}
