//! Typed request parameters and their wire encodings.
//!
//! [`QueryParams`] is a mapping from field name to a closed set of value
//! types. The same mapping is encoded two ways:
//!
//! - **form** (`application/x-www-form-urlencoded`) for the legacy API, where
//!   the encoded string is also what the request signature covers;
//! - **JSON** for the current API, either as a request body or escaped into
//!   the query string as a single blob.
//!
//! Values that an encoding cannot represent are dropped with a `warn!`
//! diagnostic instead of being written in a corrupted form.

use std::collections::BTreeMap;

use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::error::Result;

/// Wire encoding of a [`QueryParams`] mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// URL-encoded `key=value` pairs.
    Form,
    /// A single JSON object.
    Json,
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Int(i64),
    Uint(u64),
    Bool(bool),
    String(String),
    /// Omitted from form output, `null` in JSON.
    Null,
    /// JSON only.
    Float(f64),
    /// JSON only.
    Map(QueryParams),
    /// JSON only.
    List(Vec<QueryValue>),
    /// A value with no wire representation. Never encoded; the string names
    /// the offending type for the diagnostic.
    Unsupported(String),
}

impl QueryValue {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            QueryValue::Int(_) => "int",
            QueryValue::Uint(_) => "uint",
            QueryValue::Bool(_) => "bool",
            QueryValue::String(_) => "string",
            QueryValue::Null => "null",
            QueryValue::Float(_) => "float",
            QueryValue::Map(_) => "map",
            QueryValue::List(_) => "list",
            QueryValue::Unsupported(name) => name,
        }
    }

    fn to_form(&self) -> FormValue {
        match self {
            QueryValue::Int(v) => FormValue::Emit(v.to_string()),
            QueryValue::Uint(v) => FormValue::Emit(v.to_string()),
            QueryValue::Bool(v) => FormValue::Emit(v.to_string()),
            QueryValue::String(v) => FormValue::Emit(v.clone()),
            QueryValue::Null => FormValue::Skip,
            QueryValue::Float(_)
            | QueryValue::Map(_)
            | QueryValue::List(_)
            | QueryValue::Unsupported(_) => FormValue::Drop,
        }
    }

    /// JSON representation, or `None` for unsupported values and non-finite
    /// floats.
    fn to_json(&self, path: &str) -> Option<Value> {
        match self {
            QueryValue::Int(v) => Some(Value::from(*v)),
            QueryValue::Uint(v) => Some(Value::from(*v)),
            QueryValue::Bool(v) => Some(Value::Bool(*v)),
            QueryValue::String(v) => Some(Value::String(v.clone())),
            QueryValue::Null => Some(Value::Null),
            QueryValue::Float(v) => match serde_json::Number::from_f64(*v) {
                Some(n) => Some(Value::Number(n)),
                None => {
                    warn!(field = %path, value = %v, "non-finite float has no JSON form, dropping field");
                    None
                }
            },
            QueryValue::Map(map) => Some(map.to_json_value_at(path)),
            QueryValue::List(items) => Some(Value::Array(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| item.to_json(&format!("{}[{}]", path, i)))
                    .collect(),
            )),
            QueryValue::Unsupported(name) => {
                warn!(field = %path, value_type = %name, "unrecognized parameter type, dropping field");
                None
            }
        }
    }
}

enum FormValue {
    Emit(String),
    Skip,
    Drop,
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for QueryValue {
            fn from(v: $t) -> Self {
                QueryValue::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for QueryValue {
            fn from(v: $t) -> Self {
                QueryValue::Uint(u64::from(v))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for QueryValue {
    fn from(v: isize) -> Self {
        QueryValue::Int(v as i64)
    }
}

impl From<usize> for QueryValue {
    fn from(v: usize) -> Self {
        QueryValue::Uint(v as u64)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::Float(v)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::String(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::String(v)
    }
}

impl From<QueryParams> for QueryValue {
    fn from(v: QueryParams) -> Self {
        QueryValue::Map(v)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(v: Vec<T>) -> Self {
        QueryValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(QueryValue::Null, Into::into)
    }
}

/// Request parameters keyed by field name.
///
/// Keys iterate in sorted order, so form output is stable for a given mapping.
///
/// ```rust
/// use megaplan_client::{Encoding, QueryParams};
///
/// let params = QueryParams::new()
///     .with("Limit", 10)
///     .with("Status", "actual")
///     .with("Folder", None::<String>);
///
/// assert_eq!(params.encode(Encoding::Form).unwrap(), "Limit=10&Status=actual");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: BTreeMap<String, QueryValue>,
}

/// Result of form-encoding a [`QueryParams`] mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormEncoded {
    /// Encoded pairs in key order.
    pub pairs: Vec<(String, String)>,
    /// Keys that were not encoded because their value has no form representation.
    pub dropped: Vec<String>,
}

impl FormEncoded {
    /// Returns true if no pair was emitted.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The `application/x-www-form-urlencoded` string.
    pub fn to_urlencoded(&self) -> Result<String> {
        Ok(serde_urlencoded::to_string(&self.pairs)?)
    }
}

impl QueryParams {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        self.entries.remove(key)
    }

    /// Get a value.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryValue)> {
        self.entries.iter()
    }

    /// Encode the mapping in the given wire form.
    pub fn encode(&self, encoding: Encoding) -> Result<String> {
        match encoding {
            Encoding::Form => self.to_form().to_urlencoded(),
            Encoding::Json => self.to_json(),
        }
    }

    /// Form-encode scalar values. `Null` entries are skipped silently; values
    /// with no form representation are dropped and reported.
    pub fn to_form(&self) -> FormEncoded {
        let mut encoded = FormEncoded::default();
        for (key, value) in &self.entries {
            match value.to_form() {
                FormValue::Emit(v) => encoded.pairs.push((key.clone(), v)),
                FormValue::Skip => {}
                FormValue::Drop => {
                    warn!(field = %key, value_type = %value.type_name(), "unrecognized parameter type, dropping field");
                    encoded.dropped.push(key.clone());
                }
            }
        }
        encoded
    }

    /// The mapping as a JSON value, with unsupported values removed.
    pub fn to_json_value(&self) -> Value {
        self.to_json_value_at("")
    }

    fn to_json_value_at(&self, prefix: &str) -> Value {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.entries {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            if let Some(json) = value.to_json(&path) {
                map.insert(key.clone(), json);
            }
        }
        Value::Object(map)
    }

    /// Serialize the mapping as a compact JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json_value())?)
    }

    /// Indented JSON, for logs and debugging.
    pub fn pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json_value())?)
    }

    /// The JSON encoding escaped as one query-string component, which is how
    /// the current API expects GET parameters (`/path?%7B...%7D`).
    pub fn query_escape(&self) -> Result<String> {
        let json = self.to_json()?;
        Ok(url::form_urlencoded::byte_serialize(json.as_bytes()).collect())
    }
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
