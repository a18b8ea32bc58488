//! Aggregate statistics over processed tables.
//!
//! Pure functions: they read a [`Table`] and return derived numbers, no
//! pipeline state involved.  Columns absent from the table are skipped
//! silently, and cells that are not numeric (or not dated, for trends) are
//! ignored rather than treated as errors; preprocessing already decided
//! what survives.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::data::model::Table;

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Per-column aggregate over every numeric value in the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n − 1 denominator); 0.0 below two values.
    pub std_dev: f64,
    /// Number of non-null numeric values.
    pub count: usize,
}

/// Compute [`SummaryStats`] for each of the named value columns.
pub fn summary_statistics(
    table: &Table,
    value_columns: &[String],
) -> BTreeMap<String, SummaryStats> {
    let mut summary = BTreeMap::new();
    for col in value_columns {
        if !table.has_column(col) {
            continue;
        }
        let mut values: Vec<f64> = table.column_values(col).filter_map(|v| v.as_f64()).collect();
        if values.is_empty() {
            continue;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let total: f64 = values.iter().sum();
        let mean = total / count as f64;
        let variance = if count > 1 {
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64
        } else {
            0.0
        };

        summary.insert(
            col.clone(),
            SummaryStats {
                total,
                mean,
                median: median_of_sorted(&values),
                min: values[0],
                max: values[count - 1],
                std_dev: variance.sqrt(),
                count,
            },
        );
    }
    summary
}

fn median_of_sorted(values: &[f64]) -> f64 {
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

// ---------------------------------------------------------------------------
// Monthly trend series
// ---------------------------------------------------------------------------

/// One calendar month of a value column's trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// First day of the month this bucket covers.
    pub month: NaiveDate,
    pub sum: f64,
    pub mean: f64,
    pub count: usize,
    /// Percentage change of `sum` versus the previous bucket.  `None` for
    /// the first bucket and after a zero-sum month.
    pub growth_rate: Option<f64>,
    /// Trailing moving average of `sum` over at most three buckets.
    pub moving_avg: f64,
}

/// Group records into calendar-month buckets keyed by `date_column` and
/// compute sum / mean / count, month-over-month growth and a three-month
/// trailing moving average per value column.  Buckets come back in
/// chronological order.
pub fn trend_analysis(
    table: &Table,
    date_column: &str,
    value_columns: &[String],
) -> BTreeMap<String, Vec<MonthlyBucket>> {
    let mut trends = BTreeMap::new();
    for col in value_columns {
        if !table.has_column(col) {
            continue;
        }

        // BTreeMap keys keep the buckets chronological.
        let mut by_month: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for row in &table.rows {
            let Some(date) = row.get(date_column).and_then(|c| c.as_date()) else {
                continue;
            };
            let Some(value) = row.get(col).and_then(|c| c.as_f64()) else {
                continue;
            };
            let Some(month) = NaiveDate::from_ymd_opt(date.year(), date.month(), 1) else {
                continue;
            };
            by_month.entry(month).or_default().push(value);
        }

        let mut buckets: Vec<MonthlyBucket> = Vec::with_capacity(by_month.len());
        let mut sums: Vec<f64> = Vec::with_capacity(by_month.len());
        for (month, values) in by_month {
            let count = values.len();
            let sum: f64 = values.iter().sum();

            let growth_rate = sums.last().and_then(|&prev| {
                (prev != 0.0).then(|| (sum - prev) / prev * 100.0)
            });
            sums.push(sum);
            let window = &sums[sums.len().saturating_sub(3)..];
            let moving_avg = window.iter().sum::<f64>() / window.len() as f64;

            buckets.push(MonthlyBucket {
                month,
                sum,
                mean: sum / count as f64,
                count,
                growth_rate,
                moving_avg,
            });
        }
        trends.insert(col.clone(), buckets);
    }
    trends
}

// ---------------------------------------------------------------------------
// Distribution bins
// ---------------------------------------------------------------------------

/// One equal-width bin of a column's value distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Bin a column's numeric values into `bins` equal-width intervals spanning
/// min..max.  Returns an empty vector for an absent column, no numeric
/// values, or `bins == 0`.
pub fn histogram(table: &Table, column: &str, bins: usize) -> Vec<HistogramBin> {
    if bins == 0 || !table.has_column(column) {
        return Vec::new();
    }
    let values: Vec<f64> = table
        .column_values(column)
        .filter_map(|v| v.as_f64())
        .collect();
    if values.is_empty() {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Record};

    fn table_with_values(rows: &[(&str, f64)]) -> Table {
        let mut table = Table::new("orders", vec!["ReceivedDate".into(), "Value$".into()]);
        for &(date, value) in rows {
            let mut row = Record::new();
            row.insert(
                "ReceivedDate".to_string(),
                CellValue::DateTime(
                    NaiveDate::parse_from_str(date, "%Y-%m-%d")
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                ),
            );
            row.insert("Value$".to_string(), CellValue::Float(value));
            table.rows.push(row);
        }
        table
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn summary_of_two_orders() {
        let table = table_with_values(&[("2023-01-01", 100.0), ("2023-01-02", 200.0)]);
        let summary = summary_statistics(&table, &cols(&["Value$"]));
        let stats = &summary["Value$"];

        assert_eq!(stats.total, 300.0);
        assert_eq!(stats.mean, 150.0);
        assert_eq!(stats.median, 150.0);
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 200.0);
        assert_eq!(stats.count, 2);
    }

    #[test]
    fn summary_skips_absent_columns() {
        let table = table_with_values(&[("2023-01-01", 100.0)]);
        let summary = summary_statistics(&table, &cols(&["Value$", "Nope"]));
        assert!(summary.contains_key("Value$"));
        assert!(!summary.contains_key("Nope"));
    }

    #[test]
    fn median_of_odd_count() {
        let table = table_with_values(&[
            ("2023-01-01", 10.0),
            ("2023-01-02", 99.0),
            ("2023-01-03", 20.0),
        ]);
        let summary = summary_statistics(&table, &cols(&["Value$"]));
        assert_eq!(summary["Value$"].median, 20.0);
    }

    #[test]
    fn sample_std_dev() {
        let table = table_with_values(&[
            ("2023-01-01", 2.0),
            ("2023-01-02", 4.0),
            ("2023-01-03", 4.0),
            ("2023-01-04", 4.0),
            ("2023-01-05", 5.0),
            ("2023-01-06", 5.0),
            ("2023-01-07", 7.0),
            ("2023-01-08", 9.0),
        ]);
        let summary = summary_statistics(&table, &cols(&["Value$"]));
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((summary["Value$"].std_dev - expected).abs() < 1e-9);
    }

    #[test]
    fn monthly_growth_and_moving_average() {
        let table = table_with_values(&[
            ("2023-01-10", 100.0),
            ("2023-02-10", 150.0),
            ("2023-03-10", 200.0),
        ]);
        let trends = trend_analysis(&table, "ReceivedDate", &cols(&["Value$"]));
        let buckets = &trends["Value$"];
        assert_eq!(buckets.len(), 3);

        assert_eq!(buckets[0].growth_rate, None);
        assert_eq!(buckets[1].growth_rate, Some(50.0));
        let third = buckets[2].growth_rate.unwrap();
        assert!((third - 100.0 / 3.0).abs() < 1e-9);

        assert_eq!(buckets[0].moving_avg, 100.0);
        assert_eq!(buckets[1].moving_avg, 125.0);
        assert_eq!(buckets[2].moving_avg, 150.0);
    }

    #[test]
    fn months_come_back_in_order_with_split_buckets() {
        let table = table_with_values(&[
            ("2023-02-01", 30.0),
            ("2023-01-15", 10.0),
            ("2023-01-20", 20.0),
        ]);
        let trends = trend_analysis(&table, "ReceivedDate", &cols(&["Value$"]));
        let buckets = &trends["Value$"];

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].month, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(buckets[0].sum, 30.0);
        assert_eq!(buckets[0].mean, 15.0);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[1].sum, 30.0);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn growth_after_zero_month_is_undefined() {
        let table = table_with_values(&[("2023-01-01", 0.0), ("2023-02-01", 50.0)]);
        let trends = trend_analysis(&table, "ReceivedDate", &cols(&["Value$"]));
        assert_eq!(trends["Value$"][1].growth_rate, None);
    }

    #[test]
    fn histogram_covers_range() {
        let table = table_with_values(&[
            ("2023-01-01", 0.0),
            ("2023-01-02", 5.0),
            ("2023-01-03", 9.9),
            ("2023-01-04", 10.0),
        ]);
        let bins = histogram(&table, "Value$", 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[1].upper, 10.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        // Max value lands in the last bin, not out of range.
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 3);
    }

    #[test]
    fn histogram_degenerate_cases() {
        let table = table_with_values(&[("2023-01-01", 5.0), ("2023-01-02", 5.0)]);
        let bins = histogram(&table, "Value$", 4);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);

        assert!(histogram(&table, "Value$", 0).is_empty());
        assert!(histogram(&table, "Nope", 3).is_empty());
    }
}
