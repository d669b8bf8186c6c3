//! Documents, field values and equality filters.

use crate::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar value stored under a document field.
///
/// Timestamps are encoded as `{"seconds": .., "nanoseconds": ..}`, the shape
/// hosted document stores use, so a string that happens to look like a date
/// always reads back as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Timestamp(#[serde(with = "timestamp_json")] DateTime<Utc>),
    String(String),
}

mod timestamp_json {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Wire {
        seconds: i64,
        nanoseconds: u32,
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        Wire {
            seconds: ts.timestamp(),
            nanoseconds: ts.timestamp_subsec_nanos(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let wire = Wire::deserialize(deserializer)?;
        DateTime::from_timestamp(wire.seconds, wire.nanoseconds)
            .ok_or_else(|| D::Error::custom("timestamp out of range"))
    }
}

impl FieldValue {
    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Null, or a string that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// Flat mapping of field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    /// Creates an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Extract a string value by field name.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(FieldValue::as_str)
    }

    /// True when the field is absent, null, or whitespace-only.
    pub fn is_blank(&self, field: &str) -> bool {
        self.0.get(field).is_none_or(FieldValue::is_blank)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Overwrites our fields with every field present in `other`.
    pub fn merge(&mut self, other: &Fields) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Returns true when `filter` holds for these fields.
    pub fn matches(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Equals { field, value } => self.0.get(field) == Some(value),
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One record in a named collection.
///
/// This is also the local list item mirrored by the list synchronizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Extract a string value from `fields`.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get_str(field)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Equality constraint on a single field (`field == value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Equals { field: String, value: FieldValue },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// The constrained field name.
    pub fn field(&self) -> &str {
        match self {
            Self::Equals { field, .. } => field,
        }
    }

    /// The value the field must equal.
    pub fn value(&self) -> &FieldValue {
        match self {
            Self::Equals { value, .. } => value,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => write!(f, "{field} == {value}"),
        }
    }
}
