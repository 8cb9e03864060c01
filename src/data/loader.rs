use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Trip, TripTable};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Text encoding applied to delimited files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// UTF-8, invalid sequences replaced.
    Utf8,
}

/// A table together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: TripTable,
    pub source: PathBuf,
    /// True when the fallback file was used instead of an upload.
    pub is_fallback: bool,
}

/// Load the uploaded file if there is one, otherwise the fallback file.
///
/// A zero-byte upload counts as no upload. Uploaded text is decoded as
/// Latin-1; the fallback file as UTF-8.
pub fn load_or_default(upload: Option<&Path>, fallback: &Path) -> Result<LoadedTable> {
    let upload = match upload {
        Some(path) if is_empty_file(path)? => {
            log::warn!("Uploaded file {} is empty, using fallback", path.display());
            None
        }
        other => other,
    };

    let (path, encoding, is_fallback) = match upload {
        Some(path) => (path, TextEncoding::Latin1, false),
        None => (fallback, TextEncoding::Utf8, true),
    };

    let table = load_file(path, encoding)
        .with_context(|| format!("loading {}", path.display()))?;
    log::info!(
        "Loaded {} trips with columns {:?} from {}",
        table.len(),
        table.column_names,
        path.display()
    );

    Ok(LoadedTable {
        table,
        source: path.to_path_buf(),
        is_fallback,
    })
}

fn is_empty_file(path: &Path) -> Result<bool> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("reading metadata of {}", path.display()))?;
    Ok(meta.len() == 0)
}

/// Load a trip table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-delimited text with a header row
/// * `.xlsx` / `.xls` – first worksheet, first row is the header
/// * `.parquet`      – scalar columns
/// * `.json`         – `[{ "fare_amount": 12.5, "model": "Sedan", ... }, ...]`
pub fn load_file(path: &Path, encoding: TextEncoding) -> Result<TripTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv(file, encoding)
        }
        "xlsx" | "xls" | "xlsm" => load_spreadsheet(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text)
        }
        other => Err(DataError::UnsupportedFormat(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read comma-delimited text with a header row. Cell types are inferred per cell.
///
/// Rows shorter than the header are padded with nulls; longer rows are an error.
pub fn read_csv<R: Read>(reader: R, encoding: TextEncoding) -> Result<TripTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .byte_headers()
        .context("reading CSV headers")?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = decode(h, encoding);
            // Strip a UTF-8 byte order mark from the first header.
            let h = if i == 0 { strip_bom(&h) } else { h.as_str() };
            h.trim().to_string()
        })
        .collect();

    let mut trips = Vec::new();
    for (row_no, result) in reader.byte_records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        // A trailing empty line shows up as a single empty field.
        if headers.len() > 1 && record.len() == 1 && record.get(0).is_some_and(|f| f.is_empty()) {
            continue;
        }
        if record.len() > headers.len() {
            return Err(DataError::RaggedRow {
                row: row_no,
                expected: headers.len(),
                found: record.len(),
            }
            .into());
        }

        // Short rows are padded with nulls.
        let trip: Trip = headers
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let cell = record
                    .get(i)
                    .map_or(CellValue::Null, |raw| CellValue::infer(&decode(raw, encoding)));
                (col.clone(), cell)
            })
            .collect();
        trips.push(trip);
    }

    Ok(TripTable::from_trips(headers, trips))
}

fn decode(bytes: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{feff}')
        .or_else(|| s.strip_prefix("\u{ef}\u{bb}\u{bf}"))
        .unwrap_or(s)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Load the first worksheet of an `.xlsx` / `.xls` workbook.
fn load_spreadsheet(path: &Path) -> Result<TripTable> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DataError::NoWorksheet)?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Ok(TripTable::default()),
    };

    let trips: Vec<Trip> = rows
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .map(|(col, cell)| (col.clone(), spreadsheet_cell(cell)))
                .collect()
        })
        .collect();

    Ok(TripTable::from_trips(headers, trips))
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::infer(s),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty => CellValue::Null,
        other => CellValue::infer(&other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
///
/// Columns follow the key order of the first record.
pub fn parse_json(text: &str) -> Result<TripTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().ok_or(DataError::NotARecordArray)?;

    let mut column_names: Vec<String> = Vec::new();
    let mut trips: Vec<Trip> = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or(DataError::RowNotObject(i))?;
        if i == 0 {
            column_names = obj.keys().cloned().collect();
        }
        trips.push(
            obj.iter()
                .map(|(key, val)| (key.clone(), json_to_cell(val)))
                .collect(),
        );
    }

    Ok(TripTable::from_trips(column_names, trips))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of trip records.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Columns of types other than strings,
/// integers, floats and booleans are read as their type name.
fn load_parquet(path: &Path) -> Result<TripTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut trips = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let trip: Trip = column_names
                .iter()
                .zip(batch.columns())
                .map(|(name, col)| (name.clone(), arrow_cell(col, row)))
                .collect();
            trips.push(trip);
        }
    }

    Ok(TripTable::from_trips(column_names, trips))
}

/// Extract a single value from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    fn int<A: 'static>(col: &Arc<dyn Array>, f: impl Fn(&A) -> i64) -> Option<CellValue> {
        col.as_any().downcast_ref::<A>().map(|a| CellValue::Integer(f(a)))
    }

    if col.is_null(row) {
        return CellValue::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => Some(CellValue::String(col.as_string::<i32>().value(row).to_string())),
        DataType::LargeUtf8 => {
            Some(CellValue::String(col.as_string::<i64>().value(row).to_string()))
        }
        DataType::Int8 => int::<Int8Array>(col, |a| a.value(row) as i64),
        DataType::Int16 => int::<Int16Array>(col, |a| a.value(row) as i64),
        DataType::Int32 => int::<Int32Array>(col, |a| a.value(row) as i64),
        DataType::Int64 => int::<Int64Array>(col, |a| a.value(row)),
        DataType::UInt8 => int::<UInt8Array>(col, |a| a.value(row) as i64),
        DataType::UInt16 => int::<UInt16Array>(col, |a| a.value(row) as i64),
        DataType::UInt32 => int::<UInt32Array>(col, |a| a.value(row) as i64),
        DataType::UInt64 => int::<UInt64Array>(col, |a| a.value(row) as i64),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => None,
    };
    value.unwrap_or_else(|| CellValue::String(format!("{:?}", col.data_type())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_infers_types_per_cell() {
        let text = "fare_amount,model,passenger_count\n12.5,Sedan,1\n7,SUV,\n";
        let table = read_csv(text.as_bytes(), TextEncoding::Utf8).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names, vec!["fare_amount", "model", "passenger_count"]);
        assert_eq!(table.trips[0].get("fare_amount"), Some(&CellValue::Float(12.5)));
        assert_eq!(table.trips[1].get("fare_amount"), Some(&CellValue::Integer(7)));
        assert_eq!(table.trips[1].get("passenger_count"), Some(&CellValue::Null));
    }

    #[test]
    fn csv_decodes_latin1() {
        let bytes: &[u8] = b"model,fare_amount\nCaf\xe9,3\n";
        let table = read_csv(bytes, TextEncoding::Latin1).unwrap();
        assert_eq!(
            table.trips[0].get("model"),
            Some(&CellValue::String("Café".into()))
        );
    }

    #[test]
    fn csv_strips_bom_from_first_header() {
        let text = "\u{feff}fare_amount,model\n1,A\n";
        let table = read_csv(text.as_bytes(), TextEncoding::Utf8).unwrap();
        assert_eq!(table.column_names[0], "fare_amount");
    }

    #[test]
    fn csv_rejects_long_rows() {
        let text = "a,b\n1,2\n3,4,5\n";
        let err = read_csv(text.as_bytes(), TextEncoding::Utf8).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::RaggedRow { row: 1, expected: 2, found: 3 })
        ));
    }

    #[test]
    fn csv_pads_short_rows_with_nulls() {
        let text = "a,b,c\n1,2,3\n4\n";
        let table = read_csv(text.as_bytes(), TextEncoding::Utf8).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.trips[1].get("a"), Some(&CellValue::Integer(4)));
        assert_eq!(table.trips[1].get("b"), Some(&CellValue::Null));
        assert_eq!(table.trips[1].get("c"), Some(&CellValue::Null));
    }

    #[test]
    fn json_records_become_trips() {
        let text = r#"[{"fare_amount": 10.5, "year": 2019}, {"fare_amount": null, "year": 2020}]"#;
        let table = parse_json(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.trips[1].get("fare_amount"), Some(&CellValue::Null));
        assert_eq!(table.extent("year").map(|e| e.max), Some(2020.0));
    }

    #[test]
    fn json_columns_keep_file_order() {
        let text = r#"[{"year": 2019, "fare_amount": 3.5, "model": "Sedan"}]"#;
        let table = parse_json(text).unwrap();
        assert_eq!(table.column_names, vec!["year", "fare_amount", "model"]);
    }

    #[test]
    fn json_rejects_non_array() {
        let err = parse_json(r#"{"fare_amount": 1}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::NotARecordArray)
        ));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = load_file(Path::new("trips.docx"), TextEncoding::Utf8).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedFormat(ext)) if ext == "docx"
        ));
    }

    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("taxi-dashboard-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_upload_falls_back() {
        let fallback = scratch_file("fallback_a.csv", b"fare_amount\n1\n2\n");
        let loaded = load_or_default(None, &fallback).unwrap();
        assert!(loaded.is_fallback);
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.source, fallback);
    }

    #[test]
    fn empty_upload_falls_back() {
        let fallback = scratch_file("fallback_b.csv", b"fare_amount\n1\n2\n3\n");
        let upload = scratch_file("upload_empty.csv", b"");
        let loaded = load_or_default(Some(&upload), &fallback).unwrap();
        assert!(loaded.is_fallback);
        assert_eq!(loaded.table.len(), 3);
    }

    #[test]
    fn upload_wins_over_fallback() {
        let fallback = scratch_file("fallback_c.csv", b"fare_amount\n1\n");
        let upload = scratch_file("upload_c.txt", b"fare_amount\n4\n5\n");
        let loaded = load_or_default(Some(&upload), &fallback).unwrap();
        assert!(!loaded.is_fallback);
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.source, upload);
    }
}
