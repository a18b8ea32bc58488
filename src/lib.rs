//! Data core of an order-tracking dashboard.
//!
//! Loads a multi-sheet workbook (Excel file, directory of CSVs, or
//! records-oriented JSON), validates each sheet against its declared schema,
//! coerces dates and values, drops incomplete records, and serves memoized
//! summary/trend analytics over the result.  The chart layer on top is a
//! separate concern; this crate ends at the numbers it would render.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod data;
pub mod session;

pub use analytics::{HistogramBin, MonthlyBucket, SummaryStats};
pub use cache::{TtlCache, DEFAULT_TTL};
pub use config::{order_tracker_schemas, schemas_from_json, SchemaMap, SheetSchema};
pub use data::model::{CellValue, Dataset, Record, Table};
pub use data::processor::DataProcessor;
pub use session::Session;
