use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{parse_datetime, CellValue, Record, Table};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while reading raw tables from a workbook source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported workbook source: {}", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { sheet: String, path: PathBuf },

    #[error("sheet '{sheet}' row {row}: expected a JSON object")]
    MalformedRow { sheet: String, row: usize },

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Read one named table from a workbook source.  Dispatch by source shape:
///
/// * `.xlsx` / `.xlsm` – Excel workbook, one table per worksheet
/// * directory         – one `.csv` file per sheet, sheet name = file stem
/// * `.json`           – `{ "<sheet>": [ {col: value, ...}, ... ] }`
///
/// The first row (xlsx/csv) is the header row defining column names.
pub fn read_sheet(source: &Path, sheet: &str) -> Result<Table> {
    if source.is_dir() {
        return read_csv_sheet(source, sheet);
    }
    match extension(source).as_str() {
        "xlsx" | "xlsm" => read_xlsx_sheet(source, sheet),
        "json" => read_json_sheet(source, sheet),
        _ => Err(LoadError::UnsupportedSource(source.to_path_buf())),
    }
}

/// List the sheet names a workbook source offers, without loading data.
pub fn sheet_names(source: &Path) -> Result<Vec<String>> {
    if source.is_dir() {
        return csv_sheet_names(source);
    }
    match extension(source).as_str() {
        "xlsx" | "xlsm" => {
            let workbook: Xlsx<BufReader<File>> = open_workbook(source)?;
            Ok(workbook.sheet_names().to_vec())
        }
        "json" => {
            let root: JsonValue = serde_json::from_str(&std::fs::read_to_string(source)?)?;
            Ok(root
                .as_object()
                .map(|obj| obj.keys().cloned().collect())
                .unwrap_or_default())
        }
        _ => Err(LoadError::UnsupportedSource(source.to_path_buf())),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Excel workbook
// ---------------------------------------------------------------------------

fn read_xlsx_sheet(path: &Path, sheet: &str) -> Result<Table> {
    let mut workbook: Xlsx<BufReader<File>> = open_workbook(path)?;
    let range = workbook.worksheet_range(sheet)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::new(sheet, Vec::new()));
    };
    let columns: Vec<String> = header.iter().map(header_name).collect();

    let mut table = Table::new(sheet, columns);
    for row in rows {
        let mut record = Record::new();
        for (i, cell) in row.iter().enumerate() {
            if let Some(col) = table.columns.get(i) {
                record.insert(col.clone(), data_to_cell(cell));
            }
        }
        if record.values().all(CellValue::is_null) {
            continue;
        }
        table.rows.push(record);
    }
    Ok(table)
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Null),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        // Formula errors (#DIV/0! and friends) carry no usable value.
        Data::Error(_) => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV directory
// ---------------------------------------------------------------------------

/// One `.csv` file per sheet inside the directory; values are type-inferred
/// since CSV carries no cell types.
fn read_csv_sheet(dir: &Path, sheet: &str) -> Result<Table> {
    let path = dir.join(format!("{sheet}.csv"));
    if !path.is_file() {
        return Err(LoadError::SheetNotFound {
            sheet: sheet.to_string(),
            path: dir.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(&path)?;
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(sheet, columns);
    for result in reader.records() {
        let record = result?;
        let mut row = Record::new();
        for (i, field) in record.iter().enumerate() {
            if let Some(col) = table.columns.get(i) {
                row.insert(col.clone(), CellValue::parse(field));
            }
        }
        if row.values().all(CellValue::is_null) {
            continue;
        }
        table.rows.push(row);
    }
    Ok(table)
}

fn csv_sheet_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

// ---------------------------------------------------------------------------
// JSON workbook
// ---------------------------------------------------------------------------

/// Records-oriented JSON: the root object maps sheet names to arrays of
/// `{column: value}` rows.
fn read_json_sheet(path: &Path, sheet: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let records = root
        .get(sheet)
        .and_then(|v| v.as_array())
        .ok_or_else(|| LoadError::SheetNotFound {
            sheet: sheet.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut columns: Vec<String> = Vec::new();
    for rec in records {
        if let Some(obj) = rec.as_object() {
            for key in obj.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut table = Table::new(sheet, columns);
    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| LoadError::MalformedRow {
            sheet: sheet.to_string(),
            row: i,
        })?;
        let mut record = Record::new();
        for (key, val) in obj {
            record.insert(key.clone(), json_to_cell(val));
        }
        if record.values().all(CellValue::is_null) {
            continue;
        }
        table.rows.push(record);
    }
    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::Null => CellValue::Null,
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::String(s) if s.trim().is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::String(s.clone()),
        other => CellValue::String(other.to_string()),
    }
}
