//! Static sheet schema configuration.
//!
//! Each sheet the dashboard knows about declares one date column, the
//! numeric value columns, the identifying key columns and the columns the
//! UI offers as categorical filters.  The mapping is fixed at construction
//! time and shared read-only by the validator and the pipeline.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Column layout of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSchema {
    pub date_column: String,
    pub value_columns: Vec<String>,
    #[serde(default)]
    pub key_columns: Vec<String>,
    #[serde(default)]
    pub filter_columns: Vec<String>,
}

impl SheetSchema {
    /// The columns a record must carry to survive preprocessing:
    /// the date column plus every value column.
    pub fn critical_columns(&self) -> Vec<String> {
        let mut columns = vec![self.date_column.clone()];
        columns.extend(self.value_columns.iter().cloned());
        columns
    }
}

/// Sheet name → schema for a whole workbook.
pub type SchemaMap = BTreeMap<String, SheetSchema>;

/// Load a schema map from a JSON file of the form
/// `{ "<sheet>": { "date_column": ..., "value_columns": [...] , ... } }`.
pub fn schemas_from_json(path: &Path) -> Result<SchemaMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading schema config {}", path.display()))?;
    serde_json::from_str(&text).context("parsing schema config")
}

/// The order-tracker workbook layout: four sheets, all dated by
/// `ReceivedDate` and valued in USD and AED.
pub fn order_tracker_schemas() -> SchemaMap {
    let mut schemas = SchemaMap::new();
    schemas.insert(
        "Manual Orders Not Invoiced".to_string(),
        order_sheet(&["Reference", "Partner", "SO#", "AutodeskOrder#", "End-UserDetails"]),
    );
    schemas.insert(
        "Online Orders Not Invoiced".to_string(),
        order_sheet(&["OrderID", "Partner", "EndCustomerCompany", "SO", "Invoice#"]),
    );
    schemas.insert(
        "Online-Invoiced orders".to_string(),
        order_sheet(&["OrderID", "Partner", "EndCustomerCompany", "SO", "Invoice#"]),
    );
    schemas.insert(
        "Manual Orders-Invoiced".to_string(),
        order_sheet(&[
            "Reference",
            "Partner",
            "SO#",
            "Invoice#",
            "AutodeskOrder#",
            "End-UserDetails",
        ]),
    );
    schemas
}

fn order_sheet(key_columns: &[&str]) -> SheetSchema {
    SheetSchema {
        date_column: "ReceivedDate".to_string(),
        value_columns: vec!["Value$".to_string(), "ValueinAED".to_string()],
        key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
        filter_columns: vec!["Partner".to_string(), "PDCstatus".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_has_four_sheets() {
        let schemas = order_tracker_schemas();
        assert_eq!(schemas.len(), 4);
        for schema in schemas.values() {
            assert_eq!(schema.date_column, "ReceivedDate");
            assert_eq!(
                schema.critical_columns(),
                vec!["ReceivedDate", "Value$", "ValueinAED"]
            );
        }
    }

    #[test]
    fn schemas_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        let schemas = order_tracker_schemas();
        std::fs::write(&path, serde_json::to_string_pretty(&schemas).unwrap()).unwrap();

        let loaded = schemas_from_json(&path).unwrap();
        assert_eq!(loaded, schemas);
    }

    #[test]
    fn missing_config_file_reports_path() {
        let err = schemas_from_json(Path::new("/no/such/file.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/file.json"));
    }
}
