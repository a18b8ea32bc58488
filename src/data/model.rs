use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// CellValue – a single cell in a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the types a spreadsheet holds.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
}

const NULL_CELL: CellValue = CellValue::Null;

impl CellValue {
    /// Whether the cell holds no value.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Interpret the value as `f64` for aggregation.  Strings are not
    /// coerced here; that is the preprocessing step's decision.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The date component, if this is a date-typed cell.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    /// Parse a raw string into a `CellValue` with type inference.
    /// Tries: null → bool → int → float → string.  Dates are left as
    /// strings; turning them into `DateTime` is a coercion decision made
    /// per-column, not per-cell.
    pub fn parse(s: &str) -> CellValue {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" => return CellValue::Bool(true),
            "false" | "no" => return CellValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }
        CellValue::String(s.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.date()),
        }
    }
}

/// Parse a date or datetime string in the formats the order workbooks use.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Record / Table / Dataset
// ---------------------------------------------------------------------------

/// One row: column name → value.
pub type Record = BTreeMap<String, CellValue>;

/// One sheet's tabular data: ordered rows plus the header-row column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Sheet name this table was loaded from.
    pub name: String,
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Values of one column, row by row; rows without the column yield `Null`.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> {
        self.rows
            .iter()
            .map(move |row| row.get(column).unwrap_or(&NULL_CELL))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The full collection of named tables held by the pipeline.
pub type Dataset = BTreeMap<String, Table>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_infers_basic_types() {
        assert_eq!(CellValue::parse(""), CellValue::Null);
        assert_eq!(CellValue::parse("  "), CellValue::Null);
        assert_eq!(CellValue::parse("true"), CellValue::Bool(true));
        assert_eq!(CellValue::parse("42"), CellValue::Int(42));
        assert_eq!(CellValue::parse("-1.5"), CellValue::Float(-1.5));
        assert_eq!(
            CellValue::parse("REF1"),
            CellValue::String("REF1".to_string())
        );
    }

    #[test]
    fn parse_leaves_dates_as_strings() {
        assert_eq!(
            CellValue::parse("2023-01-01"),
            CellValue::String("2023-01-01".to_string())
        );
    }

    #[test]
    fn parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2023-01-15"), Some(expected));
        assert_eq!(parse_datetime("2023/01/15"), Some(expected));
        assert_eq!(parse_datetime("01/15/2023"), Some(expected));
        assert_eq!(
            parse_datetime("2023-01-15 10:30:00").map(|dt| dt.date()),
            Some(expected.date())
        );
        assert_eq!(parse_datetime("not a date"), None);
    }

    #[test]
    fn column_values_fills_missing_with_null() {
        let mut table = Table::new("t", vec!["a".into(), "b".into()]);
        let mut row = Record::new();
        row.insert("a".to_string(), CellValue::Int(1));
        table.rows.push(row);

        let vals: Vec<_> = table.column_values("b").collect();
        assert_eq!(vals, vec![&CellValue::Null]);
        assert!(table.has_column("b"));
        assert!(!table.has_column("c"));
    }
}
