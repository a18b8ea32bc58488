//! Per-user dashboard context.
//!
//! One `Session` owns one pipeline and the memoized analysis results, so a
//! request handler gets everything through an explicit object instead of
//! shared globals.  Lifecycle is the caller's: typically one `Session` per
//! user session, dropped with it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::analytics::{self, MonthlyBucket, SummaryStats};
use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::config::SchemaMap;
use crate::data::model::Table;
use crate::data::processor::DataProcessor;

type SummaryMap = BTreeMap<String, SummaryStats>;
type TrendMap = BTreeMap<String, Vec<MonthlyBucket>>;

pub struct Session {
    processor: DataProcessor,
    summary_cache: TtlCache<SummaryMap>,
    trend_cache: TtlCache<TrendMap>,
    last_update: Option<NaiveDateTime>,
}

impl Session {
    pub fn new(source: impl Into<PathBuf>, schemas: SchemaMap) -> Self {
        Self {
            processor: DataProcessor::new(source, schemas),
            summary_cache: TtlCache::new(),
            trend_cache: TtlCache::new(),
            last_update: None,
        }
    }

    /// Load the workbook unless it is already loaded.
    pub fn ensure_loaded(&mut self) -> (bool, String) {
        if self.processor.is_loaded() {
            (true, String::new())
        } else {
            self.reload()
        }
    }

    /// The explicit refresh action: evict every cache, reload everything.
    pub fn refresh(&mut self) -> (bool, String) {
        self.processor.clear_cache();
        self.invalidate_analysis();
        self.reload()
    }

    fn reload(&mut self) -> (bool, String) {
        let (success, message) = self.processor.load_all();
        if success {
            self.last_update = Some(Local::now().naive_local());
        }
        (success, message)
    }

    pub fn filter_by_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.processor.filter_by_date_range(start, end);
        // Memoized aggregates describe the pre-filter dataset.
        self.invalidate_analysis();
    }

    pub fn filter_by_column(&mut self, column: &str, selected: &BTreeSet<String>) {
        self.processor.filter_by_column(column, selected);
        self.invalidate_analysis();
    }

    fn invalidate_analysis(&self) {
        self.summary_cache.clear();
        self.trend_cache.clear();
    }

    /// Summary statistics for one value column of one sheet, memoized per
    /// sheet under `"summary/<sheet>"`.
    pub fn summary(&self, sheet: &str, column: &str) -> Option<SummaryStats> {
        let table = self.processor.get_table(sheet)?;
        let schema = self.processor.schema(sheet)?;
        let computed = self
            .summary_cache
            .get_or_compute(&format!("summary/{sheet}"), DEFAULT_TTL, || {
                analytics::summary_statistics(table, &schema.value_columns)
            });
        computed.get(column).cloned()
    }

    /// Monthly trend series for one value column of one sheet, memoized per
    /// sheet under `"trends/<sheet>"`.
    pub fn trends(&self, sheet: &str, column: &str) -> Option<Vec<MonthlyBucket>> {
        let table = self.processor.get_table(sheet)?;
        let schema = self.processor.schema(sheet)?;
        let computed = self
            .trend_cache
            .get_or_compute(&format!("trends/{sheet}"), DEFAULT_TTL, || {
                analytics::trend_analysis(table, &schema.date_column, &schema.value_columns)
            });
        computed.get(column).cloned()
    }

    pub fn table(&self, sheet: &str) -> Option<&Table> {
        self.processor.get_table(sheet)
    }

    pub fn processor(&self) -> &DataProcessor {
        &self.processor
    }

    pub fn last_update(&self) -> Option<NaiveDateTime> {
        self.last_update
    }
}
