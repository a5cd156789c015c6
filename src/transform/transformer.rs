//! Row/column cleanups applied between ingest and upload

use super::types::{
    CoercionPolicy, DerivedColumn, DerivedOp, PartitionKey, TransformConfig, TransformStats,
    PARTITION_COLUMNS,
};
use crate::error::{Error, Result};
use crate::types::{ColumnKind, RecordSet, Scalar};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Applies date coercion, null fill, dedup, derived columns and partition tagging
#[derive(Debug, Clone)]
pub struct Transformer {
    config: TransformConfig,
    key: PartitionKey,
}

impl Transformer {
    /// Create a transformer for one pipeline run
    pub fn new(config: TransformConfig, key: PartitionKey) -> Self {
        Self { config, key }
    }

    /// Partition key stamped on every row
    pub fn partition_key(&self) -> PartitionKey {
        self.key
    }

    /// Transform a record set
    pub fn apply(&self, set: RecordSet) -> Result<RecordSet> {
        self.apply_with_stats(set).map(|(set, _)| set)
    }

    /// Transform a record set and report what changed
    pub fn apply_with_stats(&self, mut set: RecordSet) -> Result<(RecordSet, TransformStats)> {
        let mut stats = TransformStats {
            input_rows: set.len(),
            ..TransformStats::default()
        };
        info!("Transforming {} records", set.len());

        let date_columns = self.date_columns(&set);
        self.coerce_dates(&mut set, &date_columns, &mut stats)?;

        let mut skip: HashSet<&str> = PARTITION_COLUMNS.iter().copied().collect();
        skip.extend(date_columns.iter().map(String::as_str));
        stats.cells_filled = self.fill_nulls(&mut set, &skip);

        // Coercion and fill can make rows equal, so dedup runs after both
        if self.config.drop_duplicates {
            stats.duplicates_removed = drop_duplicates(&mut set);
            info!(
                "Duplicates removed: {}, {} records left",
                stats.duplicates_removed,
                set.len()
            );
        }

        for derived in &self.config.derived {
            derive_column(&mut set, derived);
        }

        self.tag_partition(&mut set);

        stats.output_rows = set.len();
        info!("Transform finished: {} records", stats.output_rows);
        Ok((set, stats))
    }

    /// Columns subject to date coercion
    fn date_columns(&self, set: &RecordSet) -> Vec<String> {
        if let Some(columns) = &self.config.dates.columns {
            return columns
                .iter()
                .filter(|c| set.has_column(c))
                .cloned()
                .collect();
        }

        set.columns()
            .iter()
            .filter(|c| !PARTITION_COLUMNS.contains(&c.as_str()))
            .filter(|c| {
                let lower = c.to_lowercase();
                lower.contains("data") || lower.contains("date")
            })
            .filter(|c| match set.column_kind(c) {
                ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::Null => true,
                kind => {
                    warn!("Column '{c}' looks like a date but holds {kind:?} values, not converting");
                    false
                }
            })
            .cloned()
            .collect()
    }

    fn coerce_dates(
        &self,
        set: &mut RecordSet,
        columns: &[String],
        stats: &mut TransformStats,
    ) -> Result<()> {
        if columns.is_empty() {
            return Ok(());
        }

        let formats = &self.config.dates.formats;
        let policy = self.config.dates.on_error;
        let mut dropped = vec![false; set.len()];

        for (idx, row) in set.rows_mut().iter_mut().enumerate() {
            for column in columns {
                let Some(value) = row.get_mut(column) else {
                    continue;
                };
                let parsed = match value {
                    Scalar::Null | Scalar::Timestamp(_) => continue,
                    Scalar::Text(s) => parse_timestamp(s, formats),
                    _ => None,
                };

                if let Some(ts) = parsed {
                    *value = Scalar::Timestamp(ts);
                    stats.cells_coerced += 1;
                    continue;
                }

                match policy {
                    CoercionPolicy::Abort => {
                        return Err(Error::TypeCoercion {
                            column: column.clone(),
                            row: idx + 1,
                            value: value.render(),
                        });
                    }
                    CoercionPolicy::DropRow => {
                        warn!(
                            "Dropping row {}: '{}' in column '{column}' is not a date",
                            idx + 1,
                            value.render()
                        );
                        dropped[idx] = true;
                    }
                    CoercionPolicy::Nullify => {
                        warn!(
                            "Row {}: '{}' in column '{column}' is not a date, set to null",
                            idx + 1,
                            value.render()
                        );
                        *value = Scalar::Null;
                    }
                }
            }
        }

        let mut flags = dropped.into_iter();
        let before = set.len();
        set.rows_mut()
            .retain(|_| !flags.next().unwrap_or(false));
        stats.rows_dropped = before - set.len();

        debug!("Coerced {} date cells in {:?}", stats.cells_coerced, columns);
        Ok(())
    }

    /// Replace nulls and missing keys; returns the number of cells filled
    fn fill_nulls(&self, set: &mut RecordSet, skip: &HashSet<&str>) -> usize {
        let fill = &self.config.fill;
        let candidates: Vec<String> = match &fill.columns {
            Some(columns) => columns
                .iter()
                .filter(|c| set.has_column(c))
                .cloned()
                .collect(),
            None => set.columns().to_vec(),
        };

        let mut filled = 0;
        for column in candidates {
            if skip.contains(column.as_str()) {
                continue;
            }

            let replacement = match set.column_kind(&column) {
                ColumnKind::Numeric => numeric_fill(set, &column, fill.numeric_default),
                ColumnKind::Text | ColumnKind::Null => Scalar::Text(fill.text_default.clone()),
                _ => continue,
            };

            for row in set.rows_mut() {
                let missing = row.get(&column).map_or(true, Scalar::is_null);
                if missing {
                    row.insert(column.clone(), replacement.clone());
                    filled += 1;
                }
            }
        }

        if filled > 0 {
            debug!("Filled {filled} null cells");
        }
        filled
    }

    fn tag_partition(&self, set: &mut RecordSet) {
        let columns = self.key.columns();
        for (name, _) in &columns {
            set.add_column(*name);
        }
        for row in set.rows_mut() {
            for (name, value) in &columns {
                row.insert((*name).to_string(), Scalar::Text(value.clone()));
            }
        }
    }
}

/// Remove exact duplicate rows, keeping the first occurrence
fn drop_duplicates(set: &mut RecordSet) -> usize {
    let before = set.len();
    let mut seen = HashSet::with_capacity(before);
    set.rows_mut().retain(|row| seen.insert(row.clone()));
    before - set.len()
}

/// Numeric replacement matching the column's representation
#[allow(clippy::float_cmp)]
fn numeric_fill(set: &RecordSet, column: &str, default: f64) -> Scalar {
    let has_floats = set
        .rows()
        .iter()
        .any(|r| matches!(r.get(column), Some(Scalar::Float(_))));
    if !has_floats && default.fract() == 0.0 {
        Scalar::Int(default as i64)
    } else {
        Scalar::Float(default)
    }
}

/// Parse a timestamp using RFC 3339 first, then each configured format
pub fn parse_timestamp(value: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in formats {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Compute a derived column row by row; rows missing an input get no value
fn derive_column(set: &mut RecordSet, derived: &DerivedColumn) {
    if !set.has_column(&derived.left) || !set.has_column(&derived.right) {
        debug!(
            "Skipping derived column '{}': inputs '{}'/'{}' not present",
            derived.name, derived.left, derived.right
        );
        return;
    }

    for row in set.rows_mut() {
        match compute(derived.op, row.get(&derived.left), row.get(&derived.right)) {
            Some(value) => {
                row.insert(derived.name.clone(), value);
            }
            None => {
                row.remove(&derived.name);
            }
        }
    }
    set.add_column(derived.name.clone());
    info!("Column '{}' created", derived.name);
}

fn compute(op: DerivedOp, left: Option<&Scalar>, right: Option<&Scalar>) -> Option<Scalar> {
    let (left, right) = (left?, right?);

    if let (Scalar::Int(a), Scalar::Int(b)) = (left, right) {
        let exact = match op {
            DerivedOp::Multiply => a.checked_mul(*b),
            DerivedOp::Add => a.checked_add(*b),
            DerivedOp::Subtract => a.checked_sub(*b),
            DerivedOp::Divide => None,
        };
        if let Some(value) = exact {
            return Some(Scalar::Int(value));
        }
    }

    let (a, b) = (left.as_f64()?, right.as_f64()?);
    let value = match op {
        DerivedOp::Multiply => a * b,
        DerivedOp::Add => a + b,
        DerivedOp::Subtract => a - b,
        DerivedOp::Divide if b == 0.0 => return Some(Scalar::Null),
        DerivedOp::Divide => a / b,
    };
    Some(Scalar::Float(value))
}
