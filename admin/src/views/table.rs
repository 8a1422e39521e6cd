//! In-memory filter, sort and paginate for tables
//!
//! Used when the backend does not filter a collection itself. Everything here
//! is pure and cheap enough to re-run on every state read.

use crate::envelope::{Filters, is_active};
use crate::record::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

// ── Filter ──────────────────────────────────────────────────────────

/// Equality filters plus a free-text search, AND-composed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFilter {
    /// Case-insensitive substring searched in `search_fields`
    pub search: Option<String>,
    /// Dotted field paths the search looks at
    pub search_fields: Vec<String>,
    /// Field path to required value; inactive values (`""`, `"all"`, null) are skipped
    pub equals: Filters,
}

impl TableFilter {
    /// Filter that keeps everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Search `term` in `fields`
    #[must_use]
    pub fn with_search<I, S>(mut self, term: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search = Some(term.to_string());
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Require `field` to equal `value`
    #[must_use]
    pub fn with_equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.equals.insert(field, value);
        self
    }

    /// Whether `record` passes every active filter
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let equals = self
            .equals
            .iter()
            .filter(|(_, expected)| is_active(expected))
            .all(|(field, expected)| {
                record
                    .lookup(field)
                    .is_some_and(|actual| loosely_equal(&actual, expected))
            });

        equals && self.matches_search(record)
    }

    fn matches_search(&self, record: &Record) -> bool {
        let Some(term) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        else {
            return true;
        };

        let needle = term.to_lowercase();
        self.search_fields.iter().any(|field| {
            record
                .lookup(field)
                .is_some_and(|value| text_of(&value).to_lowercase().contains(&needle))
        })
    }
}

/// Equal as JSON, or equal once both are rendered as text (`"5"` matches `5`)
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    actual == expected
        || (!actual.is_object() && !actual.is_array() && text_of(actual) == text_of(expected))
}

fn text_of(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

// ── Sort ────────────────────────────────────────────────────────────

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl SortDirection {
    /// The other direction
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// How values of the sort column compare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKind {
    /// Numeric if every present value is numeric, else dates, else text
    #[default]
    Auto,
    /// Numbers and numeric strings; anything else counts as zero
    Numeric,
    /// RFC 3339 timestamps and `YYYY-MM-DD` dates; anything else sorts first
    Date,
    /// Case-insensitive, then case-sensitive
    ///
    /// Approximates locale collation by lowercasing and comparing code
    /// points: exact for ASCII, but accented letters sort after `z`.
    Text,
}

/// The single active sort column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    /// Dotted field path; `None` keeps the original order
    pub key: Option<String>,
    /// Direction for `key`
    pub direction: SortDirection,
    /// Comparison for `key`
    pub kind: SortKind,
}

impl SortState {
    /// Sort ascending by `key`
    #[must_use]
    pub fn by(key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            ..Self::default()
        }
    }

    /// Override the comparison
    #[must_use]
    pub fn with_kind(mut self, kind: SortKind) -> Self {
        self.kind = kind;
        self
    }

    /// Column header click: a new key sorts ascending, the same key toggles
    pub fn select(&mut self, key: &str) {
        if key.is_empty() {
            tracing::warn!("Ignoring sort by an empty key");
            return;
        }

        if self.key.as_deref() == Some(key) {
            self.direction = self.direction.toggled();
        } else {
            self.key = Some(key.to_string());
            self.direction = SortDirection::Ascending;
        }
    }

    /// Server `ordering` parameter: `key` or `-key`
    #[must_use]
    pub fn ordering(&self) -> Option<String> {
        let key = self.key.as_deref().filter(|key| !key.is_empty())?;
        Some(match self.direction {
            SortDirection::Ascending => key.to_string(),
            SortDirection::Descending => format!("-{key}"),
        })
    }

    /// Stable sort of `rows` by the active column
    pub fn sort(&self, rows: &mut [&Record]) {
        let Some(key) = self.key.as_deref() else {
            return;
        };
        if key.is_empty() {
            tracing::warn!("Ignoring sort by an empty key");
            return;
        }

        let values: Vec<Option<Cow<'_, Value>>> = rows.iter().map(|r| r.lookup(key)).collect();
        let kind = match self.kind {
            SortKind::Auto => infer_kind(values.iter().flatten().map(|value| &**value)),
            explicit => explicit,
        };

        let mut keyed: Vec<(SortValue, &Record)> = values
            .iter()
            .map(|value| SortValue::new(kind, value.as_deref()))
            .zip(rows.iter().copied())
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = a.compare(b);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        for (slot, (_, record)) in rows.iter_mut().zip(keyed) {
            *slot = record;
        }
    }
}

fn infer_kind<'a>(mut present: impl Iterator<Item = &'a Value> + Clone) -> SortKind {
    if present.clone().all(|v| as_number(v).is_some()) {
        SortKind::Numeric
    } else if present.all(|v| as_timestamp(v).is_some()) {
        SortKind::Date
    } else {
        SortKind::Text
    }
}

/// Precomputed comparison key for one row
#[derive(Debug)]
enum SortValue {
    Number(f64),
    Timestamp(NaiveDateTime),
    Text { folded: String, raw: String },
}

impl SortValue {
    fn new(kind: SortKind, value: Option<&Value>) -> Self {
        match kind {
            SortKind::Numeric => Self::Number(value.and_then(as_number).unwrap_or(0.0)),
            SortKind::Date => Self::Timestamp(
                value
                    .and_then(as_timestamp)
                    .unwrap_or(NaiveDateTime::MIN),
            ),
            SortKind::Text | SortKind::Auto => {
                let raw = value.map(|v| text_of(v).into_owned()).unwrap_or_default();
                Self::Text {
                    folded: raw.to_lowercase(),
                    raw,
                }
            },
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (
                Self::Text { folded: fa, raw: ra },
                Self::Text { folded: fb, raw: rb },
            ) => fa.cmp(fb).then_with(|| ra.cmp(rb)),
            // One kind per column
            _ => Ordering::Equal,
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        },
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let s = value.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

// ── Paginate ────────────────────────────────────────────────────────

/// Rows `[(page-1)*page_size, page*page_size)` clipped to `items`
///
/// Pages past the end are empty; resetting to page 1 after a filter change
/// is the caller's job.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 {
        return &[];
    }
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `len` rows
#[must_use]
pub const fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        len.div_ceil(page_size)
    }
}

// ── Query ───────────────────────────────────────────────────────────

/// Filter, then sort, then paginate
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    /// Row filter
    pub filter: TableFilter,
    /// Active sort column
    pub sort: SortState,
    /// Page, 1-based
    pub page: usize,
    /// Rows per page
    pub page_size: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            filter: TableFilter::default(),
            sort: SortState::default(),
            page: 1,
            page_size: 10,
        }
    }
}

/// One rendered page of a table
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<'a> {
    /// Rows on this page
    pub rows: Vec<&'a Record>,
    /// Rows matching the filter across all pages
    pub total: usize,
    /// Pages for `total`
    pub total_pages: usize,
}

impl TableQuery {
    /// Run the query over `records`
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [Record]) -> TablePage<'a> {
        let mut rows: Vec<&Record> = records.iter().filter(|r| self.filter.matches(r)).collect();
        self.sort.sort(&mut rows);

        let total = rows.len();
        TablePage {
            rows: paginate(&rows, self.page, self.page_size).to_vec(),
            total,
            total_pages: total_pages(total, self.page_size),
        }
    }
}
