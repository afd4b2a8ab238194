//! Entry payload: an ordered field map

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Serialize;
use serde::Serializer;
use serde::de::DeserializeOwned;

use super::Value;
use crate::error::UsageError;

/// An ordered map of field names to values.
///
/// Used as the payload of inserts, updates and operation calls, and as the
/// named form of a key. Field order is preserved so generated parameter lists
/// are deterministic; setting an existing field replaces its value in place.
///
/// # Example
///
/// ```
/// use odata_lib::model::Entry;
///
/// let entry = Entry::new()
///     .set("ProductName", "Chai")
///     .set("UnitPrice", 18.0);
///
/// assert_eq!(entry.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    fields: Vec<(String, Value)>,
}

impl Entry {
    /// Creates an empty entry.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Sets a field, returning the updated entry.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Returns a field value by exact name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the entry has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Destructures a serializable value into an entry.
    ///
    /// Field names follow the value's serde representation, so
    /// `#[serde(rename = "...")]` maps a Rust field to its service name.
    /// The value must serialize as a map or struct.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, UsageError> {
        let json = serde_json::to_value(value).map_err(|e| UsageError::invalid_payload(e.to_string()))?;
        match json {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(name, value)| (name, Value::from_json(value)))
                .collect()),
            other => Err(UsageError::invalid_payload(format!(
                "expected a struct or map, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Converts the entry to a JSON object.
    pub fn to_json(&self) -> Result<serde_json::Value, UsageError> {
        serde_json::to_value(self).map_err(|e| UsageError::invalid_payload(e.to_string()))
    }

    /// Rehydrates the entry into a typed value.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, UsageError> {
        serde_json::from_value(self.to_json()?).map_err(|e| UsageError::invalid_payload(e.to_string()))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(n, v)| (n, v)))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Entry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entry = Entry::new();
        for (name, value) in iter {
            entry.insert(name, value);
        }
        entry
    }
}

impl<'a> IntoIterator for &'a Entry {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Capability to destructure a value into an [`Entry`].
///
/// Implemented for the map shapes a caller is likely to hold. For typed
/// structs use [`Entry::from_serialize`] (or `set_typed`/`key_typed` on the
/// fluent command), which keeps serde's field renames.
pub trait ToEntry {
    /// Returns the fields of this value.
    fn to_entry(&self) -> Entry;
}

impl ToEntry for Entry {
    fn to_entry(&self) -> Entry {
        self.clone()
    }
}

impl<V: Clone + Into<Value>> ToEntry for HashMap<String, V> {
    fn to_entry(&self) -> Entry {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<V: Clone + Into<Value>> ToEntry for BTreeMap<String, V> {
    fn to_entry(&self) -> Entry {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K: Clone + Into<String>, V: Clone + Into<Value>> ToEntry for [(K, V)] {
    fn to_entry(&self) -> Entry {
        self.iter().cloned().collect()
    }
}

impl<K: Clone + Into<String>, V: Clone + Into<Value>, const N: usize> ToEntry for [(K, V); N] {
    fn to_entry(&self) -> Entry {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Product {
        #[serde(rename = "ProductID")]
        id: i32,
        #[serde(rename = "ProductName")]
        name: String,
    }

    #[test]
    fn test_set_replaces_in_place() {
        let entry = Entry::new().set("A", 1).set("B", 2).set("A", 3);
        let fields: Vec<_> = entry.iter().map(|(n, _)| n).collect();
        assert_eq!(fields, vec!["A", "B"]);
        assert_eq!(entry.get("A"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_from_serialize_uses_renames() {
        let product = Product {
            id: 1,
            name: "Chai".to_string(),
        };
        let entry = Entry::from_serialize(&product).unwrap();
        assert_eq!(entry.get("ProductID"), Some(&Value::Int(1)));
        assert_eq!(entry.get("ProductName"), Some(&Value::from("Chai")));
    }

    #[test]
    fn test_from_serialize_rejects_scalars() {
        let err = Entry::from_serialize(&42).unwrap_err();
        assert!(matches!(err, UsageError::InvalidPayload { .. }));
    }

    #[test]
    fn test_into_typed() {
        let entry = Entry::new().set("ProductID", 7).set("ProductName", "Tofu");
        let product: Product = entry.into_typed().unwrap();
        assert_eq!(
            product,
            Product {
                id: 7,
                name: "Tofu".to_string()
            }
        );
    }

    #[test]
    fn test_to_entry_from_pairs() {
        let entry = [("OrderID", 1), ("ProductID", 2)].to_entry();
        assert_eq!(entry.len(), 2);
        assert_eq!(entry.to_json().unwrap(), serde_json::json!({"OrderID": 1, "ProductID": 2}));
    }

    #[test]
    fn test_to_json_keeps_field_order() {
        let entry = Entry::new().set("Zeta", 1).set("Alpha", Value::Null).set("Mid", "x");
        let json = entry.to_json().unwrap();
        let names: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(json["Alpha"], serde_json::Value::Null);
    }
}
