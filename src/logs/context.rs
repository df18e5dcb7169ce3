use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A single value carried in a record's context
#[derive(Clone)]
pub enum ContextValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// List-like value
    Sequence(Vec<ContextValue>),
    /// Keyed collection
    Map(Context),
    /// Object with a string form
    Display(Arc<dyn fmt::Display + Send + Sync>),
    /// Object without a string form; only its JSON snapshot is kept
    Opaque(serde_json::Value),
}

impl ContextValue {
    /// Wrap any displayable object
    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        ContextValue::Display(Arc::new(value))
    }

    /// Wrap a value that has no string form
    pub fn opaque(snapshot: serde_json::Value) -> Self {
        ContextValue::Opaque(snapshot)
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Null => f.write_str("Null"),
            ContextValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ContextValue::Int(i) => f.debug_tuple("Int").field(i).finish(),
            ContextValue::Float(x) => f.debug_tuple("Float").field(x).finish(),
            ContextValue::String(s) => f.debug_tuple("String").field(s).finish(),
            ContextValue::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            ContextValue::Map(map) => f.debug_tuple("Map").field(map).finish(),
            ContextValue::Display(d) => f.debug_tuple("Display").field(&d.to_string()).finish(),
            ContextValue::Opaque(v) => f.debug_tuple("Opaque").field(v).finish(),
        }
    }
}

impl Serialize for ContextValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ContextValue::Null => serializer.serialize_unit(),
            ContextValue::Bool(b) => serializer.serialize_bool(*b),
            ContextValue::Int(i) => serializer.serialize_i64(*i),
            ContextValue::Float(x) => serializer.serialize_f64(*x),
            ContextValue::String(s) => serializer.serialize_str(s),
            ContextValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ContextValue::Map(map) => map.serialize(serializer),
            ContextValue::Display(d) => serializer.serialize_str(&d.to_string()),
            ContextValue::Opaque(v) => v.serialize(serializer),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::String(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::String(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Int(value.into())
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Int(value)
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        ContextValue::Int(value.into())
    }
}

impl From<u64> for ContextValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => ContextValue::Int(i),
            Err(_) => ContextValue::Float(value as f64),
        }
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Float(value)
    }
}

impl<T: Into<ContextValue>> From<Option<T>> for ContextValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ContextValue::Null)
    }
}

impl<T: Into<ContextValue>> From<Vec<T>> for ContextValue {
    fn from(value: Vec<T>) -> Self {
        ContextValue::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl From<Context> for ContextValue {
    fn from(value: Context) -> Self {
        ContextValue::Map(value)
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => ContextValue::Null,
            Value::Bool(b) => ContextValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ContextValue::Int(i),
                None => match n.as_u64() {
                    Some(u) => u.into(),
                    None => ContextValue::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
            },
            Value::String(s) => ContextValue::String(s),
            Value::Array(items) => items.into(),
            Value::Object(map) => ContextValue::Map(map.into_iter().collect()),
        }
    }
}

/// Placeholder values for one record, in insertion order
#[derive(Debug, Clone, Default)]
pub struct Context {
    entries: Vec<(String, ContextValue)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value; an existing key keeps its position and gets the new value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Compact JSON encoding; unicode and slashes are written as-is
    pub fn to_json(&self) -> String {
        // Keys are strings, so the only failure left would be a broken writer
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<ContextValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}
