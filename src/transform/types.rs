//! Transform configuration and partition key types

use crate::error::{Error, Result};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Names of the partition columns, in path order
pub const PARTITION_COLUMNS: [&str; 3] = ["ano", "mes", "dia"];

/// Default replacement for missing text values
pub const DEFAULT_TEXT_FILL: &str = "desconhecido";

// ============================================================================
// Partition Key
// ============================================================================

/// Date-derived partition key shared by every row of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionKey {
    date: NaiveDate,
}

impl PartitionKey {
    /// Partition key for a given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Partition key for the current local date
    pub fn today() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    /// Parse a `YYYY-MM-DD` date
    pub fn parse(value: &str) -> Result<Self> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|_| Error::invalid_value("date", format!("'{value}' is not YYYY-MM-DD")))
    }

    /// The underlying date
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Four-digit year
    pub fn year(&self) -> String {
        format!("{:04}", self.date.year())
    }

    /// Zero-padded month
    pub fn month(&self) -> String {
        format!("{:02}", self.date.month())
    }

    /// Zero-padded day
    pub fn day(&self) -> String {
        format!("{:02}", self.date.day())
    }

    /// `(column, value)` pairs in partition order
    pub fn columns(&self) -> [(&'static str, String); 3] {
        [
            (PARTITION_COLUMNS[0], self.year()),
            (PARTITION_COLUMNS[1], self.month()),
            (PARTITION_COLUMNS[2], self.day()),
        ]
    }

    /// `YYYY/MM/DD` path fragment (raw landing layout)
    pub fn date_path(&self) -> String {
        format!("{}/{}/{}", self.year(), self.month(), self.day())
    }
}

// ============================================================================
// Coercion Policy
// ============================================================================

/// What to do with a date value that cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionPolicy {
    /// Fail the whole batch
    #[default]
    Abort,
    /// Drop the offending row and log it
    DropRow,
    /// Replace the value with null
    Nullify,
}

// ============================================================================
// Derived Columns
// ============================================================================

/// Arithmetic used to compute a derived column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedOp {
    Multiply,
    Add,
    Subtract,
    Divide,
}

/// A column computed from two numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumn {
    /// Output column
    pub name: String,
    /// Operation
    pub op: DerivedOp,
    /// Left operand column
    pub left: String,
    /// Right operand column
    pub right: String,
}

impl DerivedColumn {
    /// `name = left * right`
    pub fn product(name: &str, left: &str, right: &str) -> Self {
        Self {
            name: name.to_string(),
            op: DerivedOp::Multiply,
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

fn default_derived() -> Vec<DerivedColumn> {
    vec![DerivedColumn::product("valor_total", "preco", "quantidade")]
}

// ============================================================================
// Fill / Date config
// ============================================================================

/// Null fill configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillConfig {
    /// Replacement for numeric columns
    #[serde(default)]
    pub numeric_default: f64,
    /// Replacement for text columns
    #[serde(default = "default_text_fill")]
    pub text_default: String,
    /// Columns to fill; `None` means every numeric and text column
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

fn default_text_fill() -> String {
    DEFAULT_TEXT_FILL.to_string()
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            numeric_default: 0.0,
            text_default: default_text_fill(),
            columns: None,
        }
    }
}

/// Date coercion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateConfig {
    /// Columns to coerce; `None` means every text column named like `*data*`/`*date*`
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// chrono formats tried in order after RFC 3339
    #[serde(default = "default_date_formats")]
    pub formats: Vec<String>,
    /// Failure policy
    #[serde(default)]
    pub on_error: CoercionPolicy,
}

fn default_date_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d",
        "%d/%m/%Y",
        "%Y/%m/%d",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            columns: None,
            formats: default_date_formats(),
            on_error: CoercionPolicy::default(),
        }
    }
}

// ============================================================================
// Transform Config
// ============================================================================

/// Full transformer configuration (loadable from YAML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Remove exact duplicate rows
    #[serde(default = "default_true")]
    pub drop_duplicates: bool,
    /// Null fill
    #[serde(default)]
    pub fill: FillConfig,
    /// Date coercion
    #[serde(default)]
    pub dates: DateConfig,
    /// Derived columns
    #[serde(default = "default_derived")]
    pub derived: Vec<DerivedColumn>,
}

fn default_true() -> bool {
    true
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            drop_duplicates: true,
            fill: FillConfig::default(),
            dates: DateConfig::default(),
            derived: default_derived(),
        }
    }
}

impl TransformConfig {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read transform config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Set the coercion failure policy
    #[must_use]
    pub fn with_coercion_policy(mut self, policy: CoercionPolicy) -> Self {
        self.dates.on_error = policy;
        self
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Counters collected by one transformer run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Rows received
    pub input_rows: usize,
    /// Exact duplicates removed
    pub duplicates_removed: usize,
    /// Rows dropped by the coercion policy
    pub rows_dropped: usize,
    /// Cells coerced to timestamps
    pub cells_coerced: usize,
    /// Null or missing cells replaced by defaults
    pub cells_filled: usize,
    /// Rows returned
    pub output_rows: usize,
}
