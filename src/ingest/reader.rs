//! CSV ingestor
//!
//! Reads a delimited file into a [`RecordSet`], inferring one type per
//! column from its non-null cells.

use crate::error::{Error, Result};
use crate::types::{RecordSet, Row, Scalar};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Cell contents treated as null
pub const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NULL", "null", "NaN", "nan", "None", "<NA>",
];

/// Inferred cell type for a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Int,
    Float,
    Bool,
    Text,
}

/// Reads CSV files into record sets
#[derive(Debug, Clone)]
pub struct CsvIngestor {
    /// Field delimiter
    delimiter: u8,
}

impl Default for CsvIngestor {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvIngestor {
    /// Create an ingestor for comma-separated files
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read a local file
    pub fn read(&self, path: impl AsRef<Path>) -> Result<RecordSet> {
        let path = path.as_ref();
        let source = path.display().to_string();
        info!("Extracting data from file: {source}");

        let file = File::open(path).map_err(|e| Error::source_read(&source, e.to_string()))?;
        let set = self.read_from(file, &source)?;

        info!("Data extracted: {} records found", set.len());
        Ok(set)
    }

    /// Read CSV from any reader; `source` names it in errors
    pub fn read_from<R: Read>(&self, reader: R, source: &str) -> Result<RecordSet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| Error::source_read(source, e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(Error::source_read(source, "no columns to parse"));
        }

        let mut seen = HashSet::new();
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(Error::source_read(
                    source,
                    format!("duplicate column '{header}'"),
                ));
            }
        }

        let mut cells: Vec<Vec<Option<String>>> = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| Error::source_read(source, e.to_string()))?;
            cells.push(
                record
                    .iter()
                    .map(|cell| {
                        if NULL_MARKERS.contains(&cell.trim()) {
                            None
                        } else {
                            Some(cell.to_string())
                        }
                    })
                    .collect(),
            );
        }

        let types: Vec<CellType> = (0..headers.len())
            .map(|col| {
                let column: Vec<&str> = cells.iter().filter_map(|r| r[col].as_deref()).collect();
                infer_cell_type(&column)
            })
            .collect();
        debug!("Inferred column types for {source}: {types:?}");

        let rows = cells
            .into_iter()
            .map(|record| {
                headers
                    .iter()
                    .zip(&types)
                    .zip(record)
                    .map(|((name, cell_type), cell)| {
                        (name.clone(), cell.map_or(Scalar::Null, |c| convert(&c, *cell_type)))
                    })
                    .collect::<Row>()
            })
            .collect();

        Ok(RecordSet::with_rows(headers, rows))
    }
}

/// Pick the narrowest type every non-null cell fits
fn infer_cell_type(cells: &[&str]) -> CellType {
    if cells.is_empty() {
        return CellType::Text;
    }
    let all = |pred: fn(&str) -> bool| cells.iter().all(|c| pred(c.trim()));

    if all(|c| c.parse::<i64>().is_ok()) {
        CellType::Int
    } else if all(|c| c.parse::<f64>().is_ok()) {
        CellType::Float
    } else if all(|c| parse_bool(c).is_some()) {
        CellType::Bool
    } else {
        CellType::Text
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn convert(cell: &str, cell_type: CellType) -> Scalar {
    let trimmed = cell.trim();
    match cell_type {
        CellType::Int => trimmed.parse().map_or(Scalar::Null, Scalar::Int),
        CellType::Float => trimmed.parse().map_or(Scalar::Null, Scalar::Float),
        CellType::Bool => parse_bool(trimmed).map_or(Scalar::Null, Scalar::Bool),
        CellType::Text => Scalar::Text(cell.to_string()),
    }
}
