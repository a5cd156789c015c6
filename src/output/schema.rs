//! Arrow schema inference and record set -> Arrow conversion
//!
//! One schema is inferred for a whole record set so that every partition
//! file written from it agrees on column types.

use crate::error::{Error, Result};
use crate::types::{RecordSet, Row, Scalar};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

const TIMESTAMP_TYPE: DataType = DataType::Timestamp(TimeUnit::Microsecond, None);

/// Infer an Arrow schema for a record set, skipping `exclude`d columns
///
/// All fields are nullable. Columns without any non-null value become Utf8.
pub fn infer_schema(set: &RecordSet, exclude: &[&str]) -> Result<Schema> {
    let fields = set
        .columns()
        .iter()
        .filter(|c| !exclude.contains(&c.as_str()))
        .map(|column| column_type(set, column).map(|dt| Field::new(column, dt, true)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::new(fields))
}

/// Convert a whole record set to a single RecordBatch
pub fn record_set_to_arrow(set: &RecordSet, exclude: &[&str]) -> Result<RecordBatch> {
    let schema = Arc::new(infer_schema(set, exclude)?);
    let rows: Vec<&Row> = set.rows().iter().collect();
    build_batch(&rows, &schema)
}

/// Build a RecordBatch for a subset of rows using a known schema
pub fn build_batch(rows: &[&Row], schema: &SchemaRef) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| build_array(rows, field.name(), field.data_type()))
        .collect::<Result<Vec<_>>>()?;

    RecordBatch::try_new(Arc::clone(schema), columns)
        .map_err(|e| Error::encoding(format!("Failed to create RecordBatch: {e}")))
}

fn scalar_type(value: &Scalar) -> Option<DataType> {
    match value {
        Scalar::Null => None,
        Scalar::Bool(_) => Some(DataType::Boolean),
        Scalar::Int(_) => Some(DataType::Int64),
        Scalar::Float(_) => Some(DataType::Float64),
        Scalar::Text(_) => Some(DataType::Utf8),
        Scalar::Timestamp(_) => Some(TIMESTAMP_TYPE),
    }
}

fn column_type(set: &RecordSet, column: &str) -> Result<DataType> {
    let mut current: Option<DataType> = None;

    for value in set.rows().iter().filter_map(|r| r.get(column)) {
        let Some(value_type) = scalar_type(value) else {
            continue;
        };
        current = Some(match current {
            None => value_type,
            Some(existing) => merge_types(column, &existing, &value_type)?,
        });
    }

    Ok(current.unwrap_or(DataType::Utf8))
}

/// Merge two data types; ints widen to floats, anything else must match
fn merge_types(column: &str, type1: &DataType, type2: &DataType) -> Result<DataType> {
    match (type1, type2) {
        (a, b) if a == b => Ok(a.clone()),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            Ok(DataType::Float64)
        }
        _ => Err(Error::encoding(format!(
            "column '{column}' mixes {type1} and {type2} values"
        ))),
    }
}

#[allow(clippy::cast_precision_loss)]
fn build_array(rows: &[&Row], column: &str, data_type: &DataType) -> Result<ArrayRef> {
    let values = rows.iter().map(|r| r.get(column));

    let array: ArrayRef = match data_type {
        DataType::Boolean => Arc::new(
            values
                .map(|v| match v {
                    Some(Scalar::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        DataType::Int64 => Arc::new(
            values
                .map(|v| match v {
                    Some(Scalar::Int(i)) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        DataType::Float64 => Arc::new(
            values
                .map(|v| v.and_then(Scalar::as_f64))
                .collect::<Float64Array>(),
        ),
        DataType::Utf8 => Arc::new(
            values
                .map(|v| v.filter(|s| !s.is_null()).map(Scalar::render))
                .collect::<StringArray>(),
        ),
        DataType::Timestamp(TimeUnit::Microsecond, None) => Arc::new(
            values
                .map(|v| match v {
                    Some(Scalar::Timestamp(ts)) => Some(ts.and_utc().timestamp_micros()),
                    _ => None,
                })
                .collect::<TimestampMicrosecondArray>(),
        ),
        other => {
            return Err(Error::encoding(format!(
                "column '{column}' has unsupported type {other}"
            )))
        }
    };

    Ok(array)
}
