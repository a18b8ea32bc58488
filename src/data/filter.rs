use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::data::model::Table;

// ---------------------------------------------------------------------------
// Row-retention predicates applied to a processed table
// ---------------------------------------------------------------------------

/// Retain only records whose date-column value falls within `[start, end]`
/// inclusive.  Comparison is on the date component only; time-of-day is
/// ignored.  Records whose date cell is missing or not date-typed are
/// dropped.
pub fn retain_date_range(
    table: &Table,
    date_column: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Table {
    let rows = table
        .rows
        .iter()
        .filter(|row| {
            row.get(date_column)
                .and_then(|cell| cell.as_date())
                .is_some_and(|date| start <= date && date <= end)
        })
        .cloned()
        .collect();
    Table {
        name: table.name.clone(),
        columns: table.columns.clone(),
        rows,
    }
}

/// Retain only records whose value in `column` renders to one of the
/// selected strings.  An empty selection means nothing is selected, so
/// every record is dropped.
pub fn retain_matching(table: &Table, column: &str, selected: &BTreeSet<String>) -> Table {
    let rows = table
        .rows
        .iter()
        .filter(|row| {
            row.get(column)
                .is_some_and(|cell| selected.contains(&cell.to_string()))
        })
        .cloned()
        .collect();
    Table {
        name: table.name.clone(),
        columns: table.columns.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Record};

    fn dated_table(days: &[(u32, f64)]) -> Table {
        let mut table = Table::new("orders", vec!["ReceivedDate".into(), "Value$".into()]);
        for &(day, value) in days {
            let mut row = Record::new();
            row.insert(
                "ReceivedDate".to_string(),
                CellValue::DateTime(
                    NaiveDate::from_ymd_opt(2023, 1, day)
                        .unwrap()
                        .and_hms_opt(12, 30, 0)
                        .unwrap(),
                ),
            );
            row.insert("Value$".to_string(), CellValue::Float(value));
            table.rows.push(row);
        }
        table
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    #[test]
    fn range_is_inclusive_and_ignores_time() {
        let table = dated_table(&[(1, 100.0), (2, 200.0), (3, 300.0)]);
        let filtered = retain_date_range(&table, "ReceivedDate", day(1), day(2));
        assert_eq!(filtered.len(), 2);

        let single = retain_date_range(&table, "ReceivedDate", day(1), day(1));
        assert_eq!(single.len(), 1);
        assert_eq!(
            single.rows[0]["Value$"],
            CellValue::Float(100.0),
            "time-of-day must not exclude a record on the boundary date"
        );
    }

    #[test]
    fn narrowing_twice_matches_direct_narrow() {
        let table = dated_table(&[(1, 100.0), (5, 200.0), (9, 300.0), (20, 400.0)]);
        let wide = retain_date_range(&table, "ReceivedDate", day(1), day(10));
        let narrowed_twice = retain_date_range(&wide, "ReceivedDate", day(5), day(9));
        let direct = retain_date_range(&table, "ReceivedDate", day(5), day(9));
        assert_eq!(narrowed_twice, direct);
    }

    #[test]
    fn non_date_cells_are_dropped() {
        let mut table = dated_table(&[(1, 100.0)]);
        let mut row = Record::new();
        row.insert(
            "ReceivedDate".to_string(),
            CellValue::String("pending".to_string()),
        );
        row.insert("Value$".to_string(), CellValue::Float(999.0));
        table.rows.push(row);

        let filtered = retain_date_range(&table, "ReceivedDate", day(1), day(31));
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn matching_filter_and_empty_selection() {
        let mut table = Table::new("orders", vec!["Partner".into()]);
        for partner in ["Acme", "Globex", "Acme"] {
            let mut row = Record::new();
            row.insert(
                "Partner".to_string(),
                CellValue::String(partner.to_string()),
            );
            table.rows.push(row);
        }

        let selected: BTreeSet<String> = ["Acme".to_string()].into();
        assert_eq!(retain_matching(&table, "Partner", &selected).len(), 2);
        assert_eq!(
            retain_matching(&table, "Partner", &BTreeSet::new()).len(),
            0
        );
    }
}
