//! Tests for ingest module

use super::*;
use crate::error::Error;
use crate::types::Scalar;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn read(csv: &str) -> crate::error::Result<crate::types::RecordSet> {
    CsvIngestor::new().read_from(csv.as_bytes(), "inline.csv")
}

#[test]
fn test_read_infers_column_types() {
    let set = read("produto,preco,quantidade,ativo\ncaneta,1.5,3,true\nlapis,2,,False\n").unwrap();

    assert_eq!(
        set.columns(),
        &["produto", "preco", "quantidade", "ativo"].map(String::from)
    );
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(0, "produto"), Some(&Scalar::from("caneta")));
    assert_eq!(set.get(0, "preco"), Some(&Scalar::Float(1.5)));
    assert_eq!(set.get(1, "preco"), Some(&Scalar::Float(2.0)));
    assert_eq!(set.get(0, "quantidade"), Some(&Scalar::Int(3)));
    assert_eq!(set.get(1, "quantidade"), Some(&Scalar::Null));
    assert_eq!(set.get(1, "ativo"), Some(&Scalar::Bool(false)));
}

#[test]
fn test_null_markers() {
    let set = read("a,b\nNA,null\nN/A,x\n").unwrap();
    assert_eq!(set.get(0, "a"), Some(&Scalar::Null));
    assert_eq!(set.get(0, "b"), Some(&Scalar::Null));
    assert_eq!(set.get(1, "b"), Some(&Scalar::from("x")));
}

#[test]
fn test_header_only_file_is_empty_set() {
    let set = read("a,b\n").unwrap();
    assert!(set.is_empty());
    assert_eq!(set.columns().len(), 2);
}

#[test]
fn test_empty_file_is_source_error() {
    assert!(matches!(read(""), Err(Error::SourceRead { .. })));
}

#[test]
fn test_ragged_row_is_source_error() {
    let err = read("a,b\n1,2\n3\n").unwrap_err();
    assert!(matches!(err, Error::SourceRead { .. }));
}

#[test]
fn test_duplicate_header_is_source_error() {
    let err = read("a,a\n1,2\n").unwrap_err();
    assert!(err.to_string().contains("duplicate column 'a'"));
}

#[test]
fn test_invalid_utf8_is_source_error() {
    let bytes: &[u8] = b"a\n\xff\xfe\n";
    let err = CsvIngestor::new().read_from(bytes, "bad.csv").unwrap_err();
    assert!(matches!(err, Error::SourceRead { .. }));
}

#[test]
fn test_custom_delimiter() {
    let set = CsvIngestor::new()
        .with_delimiter(b';')
        .read_from("a;b\n1;x\n".as_bytes(), "semi.csv")
        .unwrap();
    assert_eq!(set.get(0, "a"), Some(&Scalar::Int(1)));
    assert_eq!(set.get(0, "b"), Some(&Scalar::from("x")));
}

#[test]
fn test_read_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,nome").unwrap();
    writeln!(file, "1,Ana").unwrap();
    writeln!(file, "1,Ana").unwrap();

    let set = CsvIngestor::new().read(file.path()).unwrap();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_missing_file_is_source_error() {
    let err = CsvIngestor::new().read("/definitely/not/here.csv").unwrap_err();
    assert!(matches!(err, Error::SourceRead { .. }));
}
