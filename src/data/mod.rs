/// Data layer: core types, workbook loading, validation, and filtering.
///
/// Architecture:
/// ```text
///  .xlsx / csv dir / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read one sheet → raw Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ validate  │  advisory column checks (presence / date / numeric)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ processor │  coerce types, drop incomplete rows, cache, install
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date-range / categorical narrowing of the dataset
///   └──────────┘
/// ```
pub mod filter;
pub mod loader;
pub mod model;
pub mod processor;
pub mod validate;
