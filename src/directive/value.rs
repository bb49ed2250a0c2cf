//! Resolved values: plain data, live instances, or the caller's placeholder

use serde_json::{Map as JsonMap, Number, Value};

use super::ast::DEFAULT_SENTINEL;
use crate::sdk::{Instance, LatLng, LatLngBounds, Map, Marker};

/// Result of resolving a configuration value
///
/// `H` is the placeholder handle type threaded through resolution.
/// Objects keep their keys in source order.
#[derive(Debug, Clone)]
pub enum Resolved<H> {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Resolved<H>>),
    Object(Vec<(String, Resolved<H>)>),
    /// A live object built by a registered constructor
    Instance(Instance<H>),
    /// The handle supplied by the caller
    Placeholder(H),
}

impl<H> Resolved<H> {
    /// Convert directive-free data
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Resolved::Null,
            Value::Bool(b) => Resolved::Bool(*b),
            Value::Number(n) => Resolved::Number(n.clone()),
            Value::String(s) => Resolved::String(s.clone()),
            Value::Array(items) => Resolved::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Resolved::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render back to JSON. Instances become descriptive summaries and
    /// placeholders become the default sentinel.
    pub fn to_json(&self) -> Value {
        self.to_json_with(DEFAULT_SENTINEL)
    }

    /// As [`Resolved::to_json`], writing placeholders as `sentinel`
    pub fn to_json_with(&self, sentinel: &str) -> Value {
        match self {
            Resolved::Null => Value::Null,
            Resolved::Bool(b) => Value::Bool(*b),
            Resolved::Number(n) => Value::Number(n.clone()),
            Resolved::String(s) => Value::String(s.clone()),
            Resolved::Array(items) => {
                Value::Array(items.iter().map(|item| item.to_json_with(sentinel)).collect())
            }
            Resolved::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_with(sentinel)))
                    .collect::<JsonMap<String, Value>>(),
            ),
            Resolved::Instance(instance) => instance.describe(),
            Resolved::Placeholder(_) => Value::String(sentinel.to_string()),
        }
    }

    /// Short description of what this value is, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Resolved::Null => "null",
            Resolved::Bool(_) => "a boolean",
            Resolved::Number(_) => "a number",
            Resolved::String(_) => "a string",
            Resolved::Array(_) => "an array",
            Resolved::Object(_) => "an object",
            Resolved::Instance(instance) => instance.class_name(),
            Resolved::Placeholder(_) => "the placeholder",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Resolved::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Resolved::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Resolved::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Resolved::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Resolved<H>]> {
        match self {
            Resolved::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Resolved<H>)]> {
        match self {
            Resolved::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance<H>> {
        match self {
            Resolved::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&H> {
        match self {
            Resolved::Placeholder(handle) => Some(handle),
            _ => None,
        }
    }

    /// Look up a key of an object value
    pub fn get(&self, key: &str) -> Option<&Resolved<H>> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn as_lat_lng(&self) -> Option<LatLng> {
        self.as_instance()?.as_lat_lng()
    }

    pub fn as_bounds(&self) -> Option<LatLngBounds> {
        self.as_instance()?.as_bounds()
    }

    pub fn as_map(&self) -> Option<&Map<H>> {
        match self.as_instance()? {
            Instance::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_marker(&self) -> Option<&Marker<H>> {
        match self.as_instance()? {
            Instance::Marker(marker) => Some(marker),
            _ => None,
        }
    }
}

impl<H: PartialEq> PartialEq for Resolved<H> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Resolved::Null, Resolved::Null) => true,
            (Resolved::Bool(a), Resolved::Bool(b)) => a == b,
            (Resolved::Number(a), Resolved::Number(b)) => a == b,
            (Resolved::String(a), Resolved::String(b)) => a == b,
            (Resolved::Array(a), Resolved::Array(b)) => a == b,
            (Resolved::Object(a), Resolved::Object(b)) => a == b,
            (Resolved::Instance(a), Resolved::Instance(b)) => a == b,
            (Resolved::Placeholder(a), Resolved::Placeholder(b)) => a == b,
            _ => false,
        }
    }
}

impl<H> From<&Value> for Resolved<H> {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_key_order() {
        let value = json!({"zoom": 3, "center": null, "apple": [1, "x"]});
        let resolved: Resolved<()> = Resolved::from_json(&value);
        let keys: Vec<&str> = resolved
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["zoom", "center", "apple"]);
    }

    #[test]
    fn test_json_round_trip_for_plain_data() {
        let value = json!({"a": [true, 1.5, "s", null], "b": {"c": -2}});
        let resolved: Resolved<()> = Resolved::from_json(&value);
        assert_eq!(resolved.to_json(), value);
    }

    #[test]
    fn test_placeholder_renders_as_sentinel() {
        let resolved = Resolved::Array(vec![Resolved::Placeholder(7u8), Resolved::Null]);
        assert_eq!(resolved.to_json(), json!(["div", null]));
        assert_eq!(resolved.to_json_with("canvas"), json!(["canvas", null]));
    }

    #[test]
    fn test_accessors() {
        let resolved: Resolved<()> = Resolved::from_json(&json!({"zoom": 4, "title": "x"}));
        assert_eq!(resolved.get("zoom").and_then(Resolved::as_f64), Some(4.0));
        assert_eq!(resolved.get("title").and_then(Resolved::as_str), Some("x"));
        assert!(resolved.get("missing").is_none());
        assert!(resolved.as_map().is_none());
    }
}
