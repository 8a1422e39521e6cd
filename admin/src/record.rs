//! Opaque domain records
//!
//! Bookings, tickets, banners, teams, venues and pitches all share one
//! representation: a typed identifier plus an open remainder of fields that
//! only presentation code interprets.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// Record identifier; the API uses integers for most resources and strings for some
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric primary key
    Int(i64),
    /// String key (slugs, UUIDs)
    Text(String),
}

impl RecordId {
    /// JSON form of the identifier
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A domain record: typed `id`, everything else passed through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier used for in-place replace/remove
    pub id: RecordId,
    /// Every other field of the payload
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record with no extra fields
    #[must_use]
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Decode a record from an (already unwrapped) response body
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body is not an object with an `id`.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("record: {e}")))
    }

    /// Top-level field (never `id`; use [`Record::lookup`] for that)
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Nested field by dotted path, e.g. `translations.name`
    #[must_use]
    pub fn field_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        parts.try_fold(self.fields.get(first)?, |value, part| value.get(part))
    }

    /// Any field by dotted path, `id` included
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<Cow<'_, Value>> {
        if path == "id" {
            return Some(Cow::Owned(self.id.to_value()));
        }
        self.field_path(path).map(Cow::Borrowed)
    }

    /// String field by dotted path
    #[must_use]
    pub fn text(&self, path: &str) -> Option<&str> {
        self.field_path(path).and_then(Value::as_str)
    }

    /// Shallow-merge an object response into this record
    ///
    /// The `id` key is ignored so a partial response can never re-key a record.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key != "id" {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_unknown_fields() {
        let raw = json!({
            "id": 7,
            "status": "confirmed",
            "translations": {"name": "Al Wasl Arena"},
            "price": "120.00"
        });

        let record = Record::from_value(raw.clone()).unwrap();
        assert_eq!(record.id, RecordId::Int(7));
        assert_eq!(record.text("status"), Some("confirmed"));
        assert_eq!(record.text("translations.name"), Some("Al Wasl Arena"));
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn accepts_string_ids() {
        let record = Record::from_value(json!({"id": "b-17"})).unwrap();
        assert_eq!(record.id, RecordId::from("b-17"));
        assert_eq!(record.id.to_string(), "b-17");
    }

    #[test]
    fn missing_id_is_a_decode_error() {
        let err = Record::from_value(json!({"name": "no id"})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn lookup_includes_id() {
        let record = Record::new(3).with("name", "Pitch A");
        assert_eq!(record.lookup("id").unwrap().as_ref(), &json!(3));
        assert!(record.field("id").is_none());
        assert!(record.lookup("translations.name").is_none());
    }

    #[test]
    fn merge_is_shallow_and_keeps_id() {
        let mut record = Record::new(1).with("number_of_clicks", 4).with("title", "Final");
        let patch = json!({"id": 99, "number_of_clicks": 5});

        record.merge(patch.as_object().unwrap());

        assert_eq!(record.id, RecordId::Int(1));
        assert_eq!(record.field("number_of_clicks"), Some(&json!(5)));
        assert_eq!(record.text("title"), Some("Final"));
    }
}
