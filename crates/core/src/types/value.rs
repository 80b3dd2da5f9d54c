//! The tagged value model stored by the registered store
//!
//! Every stored value belongs to one of a closed set of kinds, so the
//! classification of a value is always known without runtime introspection.

use super::classification::Classification;
use crate::errors::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value that can be stored under a storage id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Keyed container
    Map(BTreeMap<String, Value>),
    /// Structured record with a named schema
    Record {
        schema: String,
        fields: BTreeMap<String, Value>,
    },
}

impl Value {
    /// Build a structured record
    pub fn record<I, K>(schema: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Record {
            schema: schema.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build a keyed map
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The type tag recorded in the registry for this value
    pub fn classification(&self) -> Classification {
        match self {
            Value::Null => Classification::new(Classification::NULL),
            Value::Bool(_) => Classification::new(Classification::BOOLEAN),
            Value::Integer(_) => Classification::new(Classification::INTEGER),
            Value::Float(_) => Classification::new(Classification::DOUBLE),
            Value::String(_) => Classification::new(Classification::STRING),
            Value::Array(_) => Classification::new(Classification::ARRAY),
            Value::Map(_) => Classification::new(Classification::MAP),
            Value::Record { schema, .. } => Classification::new(schema.clone()),
        }
    }

    /// Look up a field of a map or record
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(field),
            Value::Record { fields, .. } => fields.get(field),
            _ => None,
        }
    }

    /// Whether this is the boolean `false`, the store's failure sentinel
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Schema name of a record
    pub fn schema(&self) -> Option<&str> {
        match self {
            Value::Record { schema, .. } => Some(schema),
            _ => None,
        }
    }

    /// Convert a serializable struct into a record with the given schema name
    pub fn from_serialize<T: Serialize>(schema: impl Into<String>, value: &T) -> Result<Self> {
        let json = serde_json::to_value(value).map_err(|e| Error::encode(e.to_string()))?;
        match Value::from(json) {
            Value::Map(fields) => Ok(Value::Record {
                schema: schema.into(),
                fields,
            }),
            other => Err(Error::encode(format!(
                "expected a struct-like value, found {}",
                other.classification()
            ))),
        }
    }

    /// Convert this value back into a typed struct
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        let json = serde_json::Value::from(self.clone());
        serde_json::from_value(json).map_err(|e| Error::decode(e.to_string()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::from(self.clone()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::from(i),
            // Non-finite floats have no JSON form
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(entries) | Value::Record {
                fields: entries, ..
            } => serde_json::Value::Object(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    #[test]
    fn test_classification_of_builtin_kinds() {
        assert_eq!(Value::Null.classification().as_str(), "NULL");
        assert_eq!(Value::Bool(true).classification().as_str(), "boolean");
        assert_eq!(Value::Integer(7).classification().as_str(), "integer");
        assert_eq!(Value::Float(1.5).classification().as_str(), "double");
        assert_eq!(Value::from("x").classification().as_str(), "string");
        assert_eq!(Value::Array(vec![]).classification().as_str(), "array");
        assert_eq!(Value::map::<_, String>([]).classification().as_str(), "map");
    }

    #[test]
    fn test_record_classified_by_schema() {
        let user = Value::record("app::User", [("name", Value::from("Ada"))]);
        assert_eq!(user.classification().as_str(), "app::User");
        assert_eq!(user.get("name"), Some(&Value::from("Ada")));
        assert_eq!(user.schema(), Some("app::User"));
    }

    #[test]
    fn test_typed_struct_roundtrip() {
        let ada = User {
            name: "Ada".to_string(),
            age: 36,
        };
        let value = Value::from_serialize("User", &ada).unwrap();
        assert_eq!(value.classification().as_str(), "User");
        assert_eq!(value.get("age"), Some(&Value::Integer(36)));

        let back: User = value.deserialize_into().unwrap();
        assert_eq!(back, ada);
    }

    #[test]
    fn test_from_serialize_rejects_scalars() {
        let err = Value::from_serialize("Number", &42).unwrap_err();
        assert!(matches!(err, Error::Encode { .. }));
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from(json!({"name": "Ada", "tags": ["x", 1, 2.5, null, false]}));
        assert_eq!(value.classification().as_str(), "map");
        assert_eq!(
            value.get("tags"),
            Some(&Value::Array(vec![
                Value::from("x"),
                Value::Integer(1),
                Value::Float(2.5),
                Value::Null,
                Value::Bool(false),
            ]))
        );

        let back = serde_json::Value::from(value);
        assert_eq!(back, json!({"name": "Ada", "tags": ["x", 1, 2.5, null, false]}));
    }

    #[test]
    fn test_is_false_only_for_boolean_false() {
        assert!(Value::Bool(false).is_false());
        assert!(!Value::Bool(true).is_false());
        assert!(!Value::Integer(0).is_false());
        assert!(!Value::Null.is_false());
    }
}
