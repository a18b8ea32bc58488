//! Advisory column checks run before type coercion.
//!
//! Every check reports a boolean (or a per-column map of booleans) and logs
//! what failed; nothing here returns an error or stops the pipeline.  Callers
//! decide whether to coerce, drop or skip based on the result.

use std::collections::BTreeMap;

use crate::data::model::{parse_datetime, CellValue, Table};

/// True iff every named column exists in the table.
pub fn required_columns(table: &Table, columns: &[String]) -> bool {
    columns.iter().all(|col| table.has_column(col))
}

/// True iff the column exists and every non-null value is date-typed or
/// date-parseable.  A single bad value fails the whole column.
pub fn date_column(table: &Table, column: &str) -> bool {
    if !table.has_column(column) {
        return false;
    }
    for (row_no, value) in table.column_values(column).enumerate() {
        let ok = match value {
            CellValue::Null | CellValue::DateTime(_) => true,
            CellValue::String(s) => parse_datetime(s).is_some(),
            _ => false,
        };
        if !ok {
            log::warn!(
                "sheet {}: column {column} row {row_no} is not a date: {value:?}",
                table.name
            );
            return false;
        }
    }
    true
}

/// Independent numeric-parseability check per column.  Absent columns map to
/// false; one column failing never blocks evaluation of the others.
pub fn numeric_columns(table: &Table, columns: &[String]) -> BTreeMap<String, bool> {
    let mut results = BTreeMap::new();
    for col in columns {
        results.insert(col.clone(), numeric_column(table, col));
    }
    results
}

fn numeric_column(table: &Table, column: &str) -> bool {
    if !table.has_column(column) {
        return false;
    }
    for (row_no, value) in table.column_values(column).enumerate() {
        let ok = match value {
            CellValue::Null | CellValue::Int(_) | CellValue::Float(_) => true,
            CellValue::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        };
        if !ok {
            log::warn!(
                "sheet {}: column {column} row {row_no} is not numeric: {value:?}",
                table.name
            );
            return false;
        }
    }
    true
}
