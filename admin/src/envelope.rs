//! Response envelopes, list pages and filter descriptors

use crate::error::ApiError;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Strip the server's `{data: ...}` wrapper if present
///
/// Applied uniformly by every service client so call sites never special-case
/// a resource.
#[must_use]
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        },
        other => other,
    }
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of records matching the filters
    pub count: u64,
    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page
    #[serde(default)]
    pub previous: Option<String>,
    /// Records on this page
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

impl Page<Record> {
    /// Decode an unwrapped list body
    ///
    /// Endpoints that skip pagination return a bare array; it becomes a
    /// single page whose `count` is its length.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body is neither a page nor an array of records.
    pub fn from_body(body: Value) -> Result<Self, ApiError> {
        match body {
            Value::Array(items) => {
                let results = items
                    .into_iter()
                    .map(Record::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self {
                    count: results.len() as u64,
                    next: None,
                    previous: None,
                    results,
                })
            },
            other => serde_json::from_value(other).map_err(|e| ApiError::Decode(format!("page: {e}"))),
        }
    }
}

/// Pagination descriptor kept by every resource slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Total number of records server-side
    pub count: u64,
    /// Whether a next page exists
    pub has_next: bool,
    /// Whether a previous page exists
    pub has_previous: bool,
    /// Current page, 1-based
    pub page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            count: 0,
            has_next: false,
            has_previous: false,
            page: 1,
        }
    }
}

impl Pagination {
    /// Recompute from a fetched page
    #[must_use]
    pub fn from_page<T>(page: &Page<T>, page_number: u32) -> Self {
        Self {
            count: page.count,
            has_next: page.next.is_some(),
            has_previous: page.previous.is_some(),
            page: page_number.max(1),
        }
    }
}

/// Free-form filter/sort descriptor (`page`, `page_limit`, `search`, `ordering`, domain filters)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, Value>);

impl Filters {
    /// Empty descriptor
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Default list descriptor: first page, empty search and ordering
    #[must_use]
    pub fn list_defaults(page_limit: u32) -> Self {
        Self::new()
            .with("page", 1)
            .with("page_limit", page_limit)
            .with("search", "")
            .with("ordering", "")
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set one key
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Whether no key is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow overwrite with `other`
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Copy without `null`, `""` and `"all"` values, with `page` normalized
    /// to what [`Filters::page`] reports
    #[must_use]
    pub fn cleaned(&self) -> Self {
        let mut cleaned = Self(
            self.0
                .iter()
                .filter(|(_, value)| is_active(value))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        if cleaned.0.contains_key("page") {
            cleaned.insert("page", self.page());
        }
        cleaned
    }

    /// Requested page, 1 when unset or unparseable
    #[must_use]
    pub fn page(&self) -> u32 {
        self.0
            .get("page")
            .and_then(|value| match value {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .and_then(|page| u32::try_from(page).ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    /// Query pairs for the cleaned descriptor
    ///
    /// Arrays become repeated keys; nested objects are skipped.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.cleaned().0 {
            match value {
                Value::Array(items) => {
                    pairs.extend(
                        items
                            .iter()
                            .filter_map(scalar_to_string)
                            .map(|s| (key.clone(), s)),
                    );
                },
                other => {
                    if let Some(s) = scalar_to_string(other) {
                        pairs.push((key.clone(), s));
                    }
                },
            }
        }
        pairs
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Whether a filter value constrains anything
#[must_use]
pub fn is_active(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty() && s != "all",
        _ => true,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
