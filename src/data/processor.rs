//! The loading pipeline: read every configured sheet concurrently, validate
//! and coerce it, drop incomplete records, and keep the results as the
//! active dataset with re-filtering support.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;

use super::filter;
use super::loader::{self, LoadError};
use super::model::{parse_datetime, CellValue, Dataset, Table};
use super::validate;
use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::config::{SchemaMap, SheetSchema};

/// Upper bound on concurrent sheet loads; small workbooks use fewer threads.
pub const MAX_LOAD_WORKERS: usize = 4;

pub struct DataProcessor {
    source: PathBuf,
    schemas: SchemaMap,
    sheets: Dataset,
    cache: TtlCache<Table>,
}

impl DataProcessor {
    pub fn new(source: impl Into<PathBuf>, schemas: SchemaMap) -> Self {
        Self {
            source: source.into(),
            schemas,
            sheets: Dataset::new(),
            cache: TtlCache::new(),
        }
    }

    /// Load every configured sheet on a bounded private worker pool.
    ///
    /// Best-effort accumulation: a sheet that fails to read makes the
    /// aggregate report `(false, last error message)`, but every sheet that
    /// loaded is still installed.  Loaded tables travel back to this thread,
    /// which is the only writer into the dataset.
    pub fn load_all(&mut self) -> (bool, String) {
        let names: Vec<String> = self.schemas.keys().cloned().collect();
        if names.is_empty() {
            return (true, String::new());
        }

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(names.len().min(MAX_LOAD_WORKERS))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                let message = format!("error loading data: {e}");
                log::error!("{message}");
                return (false, message);
            }
        };

        let results: Vec<(String, Result<Option<Table>, LoadError>)> = pool.install(|| {
            names
                .into_par_iter()
                .map(|name| {
                    let outcome = self.load_sheet(&name);
                    (name, outcome)
                })
                .collect()
        });

        let mut success = true;
        let mut error_message = String::new();
        for (name, outcome) in results {
            match outcome {
                Ok(Some(table)) => {
                    log::info!("loaded sheet {name}: {} records", table.len());
                    self.cache.put(&name, table.clone(), DEFAULT_TTL);
                    self.sheets.insert(name, table);
                }
                // Schema mismatch was already logged; the sheet is skipped.
                Ok(None) => {}
                Err(e) => {
                    success = false;
                    error_message = format!("error loading sheet {name}: {e}");
                    log::error!("{error_message}");
                }
            }
        }
        (success, error_message)
    }

    /// Read and preprocess a single sheet.
    ///
    /// `Err` is a source-read failure; `Ok(None)` means the sheet is missing
    /// a required column (or has no schema) and is skipped without failing
    /// the aggregate load.
    pub fn load_sheet(&self, name: &str) -> Result<Option<Table>, LoadError> {
        let Some(schema) = self.schemas.get(name) else {
            log::error!("no schema configured for sheet {name}");
            return Ok(None);
        };

        let raw = loader::read_sheet(&self.source, name)?;
        if !validate::required_columns(&raw, &schema.critical_columns()) {
            log::error!("missing required columns in sheet {name}");
            return Ok(None);
        }
        Ok(Some(preprocess(raw, schema)))
    }

    /// Narrow every sheet to records whose date falls in `[start, end]`
    /// inclusive.  The dataset is replaced in place; getting the full data
    /// back means reloading.
    pub fn filter_by_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        for (name, table) in &mut self.sheets {
            let Some(schema) = self.schemas.get(name) else {
                continue;
            };
            let filtered = filter::retain_date_range(table, &schema.date_column, start, end);
            log::info!(
                "filtered sheet {name} to {start}..{end}: {} of {} records",
                filtered.len(),
                table.len()
            );
            self.cache
                .put(&format!("{name}/filtered"), filtered.clone(), DEFAULT_TTL);
            *table = filtered;
        }
    }

    /// Narrow every sheet that declares `column` among its filter columns to
    /// records matching one of the selected values.
    pub fn filter_by_column(&mut self, column: &str, selected: &BTreeSet<String>) {
        for (name, table) in &mut self.sheets {
            let Some(schema) = self.schemas.get(name) else {
                continue;
            };
            if !schema.filter_columns.iter().any(|c| c == column) {
                continue;
            }
            let filtered = filter::retain_matching(table, column, selected);
            self.cache
                .put(&format!("{name}/filtered"), filtered.clone(), DEFAULT_TTL);
            *table = filtered;
        }
    }

    /// Pure lookup; never triggers a load.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.sheets.get(name)
    }

    /// The most recent cached copy of a sheet (post-load or post-filter).
    pub fn cached_table(&self, name: &str) -> Option<Table> {
        self.cache.get(name)
    }

    pub fn schema(&self, name: &str) -> Option<&SheetSchema> {
        self.schemas.get(name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sheets.keys().map(String::as_str)
    }

    pub fn is_loaded(&self) -> bool {
        !self.sheets.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Validate and clean one raw table against its schema:
///
/// 1. If the date column validates, coerce it to `DateTime`, turning
///    individually unparsable values into `Null` instead of failing the
///    whole column.
/// 2. Coerce every value column that validates numeric, same per-value
///    null-on-failure policy.
/// 3. Drop every record still holding a `Null` in the date column or any
///    value column.
pub fn preprocess(mut table: Table, schema: &SheetSchema) -> Table {
    if validate::date_column(&table, &schema.date_column) {
        coerce_column(&mut table, &schema.date_column, |cell| match cell {
            CellValue::DateTime(dt) => CellValue::DateTime(*dt),
            CellValue::String(s) => parse_datetime(s)
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Null),
            _ => CellValue::Null,
        });
    }

    let numeric = validate::numeric_columns(&table, &schema.value_columns);
    for (column, is_numeric) in numeric {
        if is_numeric {
            coerce_column(&mut table, &column, |cell| match cell {
                CellValue::Float(f) => CellValue::Float(*f),
                CellValue::Int(i) => CellValue::Float(*i as f64),
                CellValue::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(CellValue::Float)
                    .unwrap_or(CellValue::Null),
                _ => CellValue::Null,
            });
        }
    }

    let critical = schema.critical_columns();
    let before = table.len();
    table.rows.retain(|row| {
        critical
            .iter()
            .all(|col| row.get(col).is_some_and(|cell| !cell.is_null()))
    });
    if table.len() < before {
        log::info!(
            "sheet {}: dropped {} incomplete records",
            table.name,
            before - table.len()
        );
    }
    table
}

fn coerce_column(table: &mut Table, column: &str, coerce: impl Fn(&CellValue) -> CellValue) {
    for row in &mut table.rows {
        let coerced = row.get(column).map(&coerce).unwrap_or(CellValue::Null);
        row.insert(column.to_string(), coerced);
    }
}
