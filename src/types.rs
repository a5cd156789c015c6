//! Tabular record set shared by every pipeline stage
//!
//! Rows are sparse maps from column name to [`Scalar`]; the set keeps the
//! column order separately so encoding and printing stay stable.

use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Canonical timestamp format used when rendering timestamps as text
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Scalar
// ============================================================================

/// A single cell value
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Scalar {
    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view of the value (ints widen to f64)
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check if the value is an int or a float
    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_))
    }

    /// Short type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Text(_) => "text",
            Scalar::Timestamp(_) => "timestamp",
        }
    }

    /// Render as a plain string (used for partition path segments and CSV export)
    pub fn render(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
            Scalar::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::Number((*i).into()),
            Scalar::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::Timestamp(_) => Value::String(self.render()),
        }
    }
}

// Floats compare bitwise so that equality and hashing agree (NaN == NaN)
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(i) => i.hash(state),
            Scalar::Float(f) => f.to_bits().hash(state),
            Scalar::Text(s) => s.hash(state),
            Scalar::Timestamp(ts) => ts.hash(state),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Scalar::Timestamp(value)
    }
}

// ============================================================================
// Column Kind
// ============================================================================

/// Type of a column, derived from its non-null values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Only ints and floats
    Numeric,
    /// Only text
    Text,
    /// Only booleans
    Boolean,
    /// Only timestamps
    Timestamp,
    /// No non-null value at all
    Null,
    /// Values of incompatible types
    Mixed,
}

// ============================================================================
// Row / RecordSet
// ============================================================================

/// A row: column name -> value. Absent keys are allowed.
pub type Row = BTreeMap<String, Scalar>;

/// Build a row from `(column, value)` pairs
pub fn row<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<Scalar>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// In-memory table of rows with named, ordered columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RecordSet {
    /// Create an empty set with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a set from rows; columns are taken in order of first appearance
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Create a set from explicit columns and rows
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable access to rows
    pub fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check for zero rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check whether the column is part of the set
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Register a column (no-op if already present)
    pub fn add_column(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_column(&name) {
            self.columns.push(name);
        }
    }

    /// Append a row, registering any new columns
    pub fn push(&mut self, row: Row) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Value at (row, column); `None` when the key is absent
    pub fn get(&self, row: usize, column: &str) -> Option<&Scalar> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Derive the kind of a column from its non-null values
    pub fn column_kind(&self, column: &str) -> ColumnKind {
        let mut kind = ColumnKind::Null;
        for value in self.rows.iter().filter_map(|r| r.get(column)) {
            let value_kind = match value {
                Scalar::Null => continue,
                Scalar::Bool(_) => ColumnKind::Boolean,
                Scalar::Int(_) | Scalar::Float(_) => ColumnKind::Numeric,
                Scalar::Text(_) => ColumnKind::Text,
                Scalar::Timestamp(_) => ColumnKind::Timestamp,
            };
            kind = match kind {
                ColumnKind::Null => value_kind,
                k if k == value_kind => k,
                _ => return ColumnKind::Mixed,
            };
        }
        kind
    }

    /// First `n` rows as a new set
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Rows as JSON objects, keys in column order
    pub fn to_json_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for column in &self.columns {
                    if let Some(value) = row.get(column) {
                        obj.insert(column.clone(), value.to_json());
                    }
                }
                Value::Object(obj)
            })
            .collect()
    }
}

// ============================================================================
// Poll Config
// ============================================================================

/// Fixed-interval polling of an external job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two status requests
    pub interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl PollConfig {
    /// Create a poll config
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Create a poll config from whole seconds
    pub fn from_secs(interval: u64, timeout: u64) -> Self {
        Self::new(Duration::from_secs(interval), Duration::from_secs(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Scalar::Float(f64::NAN), Scalar::Float(f64::NAN));
        assert_ne!(Scalar::Float(1.0), Scalar::Int(1));
    }

    #[test]
    fn test_from_rows_keeps_first_appearance_order() {
        let set = RecordSet::from_rows(vec![
            row([("b", 1_i64)]),
            row([("a", 2_i64), ("b", 3_i64)]),
        ]);
        assert_eq!(set.columns(), &["b".to_string(), "a".to_string()]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0, "a"), None);
    }

    #[test]
    fn test_column_kind() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut set = RecordSet::from_rows(vec![
            row([("n", Scalar::Int(1)), ("t", Scalar::from("x")), ("d", ts.into())]),
            row([("n", Scalar::Float(2.5)), ("t", Scalar::Null), ("d", Scalar::Null)]),
        ]);
        set.push(row([("m", Scalar::Int(1))]));
        set.push(row([("m", Scalar::from("1"))]));

        assert_eq!(set.column_kind("n"), ColumnKind::Numeric);
        assert_eq!(set.column_kind("t"), ColumnKind::Text);
        assert_eq!(set.column_kind("d"), ColumnKind::Timestamp);
        assert_eq!(set.column_kind("m"), ColumnKind::Mixed);
        assert_eq!(set.column_kind("missing"), ColumnKind::Null);
    }

    #[test]
    fn test_to_json_records() {
        let set = RecordSet::from_rows(vec![row([
            ("_col0", Scalar::Int(1)),
            ("name", Scalar::from("Alice")),
        ])]);
        let records = set.to_json_records();
        assert_eq!(records[0]["_col0"], 1);
        assert_eq!(records[0]["name"], "Alice");
    }
}
