//! ### Aggregate
//! Groupings that turn daily rows into chart series: monthly sums,
//! point-in-time snapshots and per-category totals.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::error::{DataError, Result};
use crate::record::Record;

/// Rows at the most recent date of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub records: Vec<Record>,
}

impl Snapshot {
    /// `(category, value)` pairs, the slices of a pie chart. Rows without a
    /// category are labelled by their date.
    pub fn pairs(&self) -> Vec<(String, f64)> {
        self.records
            .iter()
            .map(|r| {
                let label = r
                    .category
                    .clone()
                    .unwrap_or_else(|| self.date.to_string());
                (label, r.value)
            })
            .collect()
    }
}

/// Sums values per calendar month. Each output row is dated the first of
/// its month and carries no category. Output is chronological.
pub fn aggregate_monthly(records: &[Record]) -> Result<Vec<Record>> {
    let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in records {
        let date = record.date.ok_or(DataError::DateRequired {
            operation: "monthly aggregation",
        })?;
        *months.entry((date.year(), date.month())).or_default() += record.value;
    }

    Ok(months
        .into_iter()
        .filter_map(|((year, month), value)| {
            let date = NaiveDate::from_ymd_opt(year, month, 1)?;
            Some(Record {
                date: Some(date),
                year,
                category: None,
                value,
            })
        })
        .collect())
}

/// Every row dated at the maximum date, with that date. `None` when no row
/// carries a date.
pub fn latest(records: &[Record]) -> Option<Snapshot> {
    let date = records.iter().filter_map(|r| r.date).max()?;
    let records = records
        .iter()
        .filter(|r| r.date == Some(date))
        .cloned()
        .collect();
    Some(Snapshot { date, records })
}

/// Total value per category, sorted by category name.
pub fn totals_by_category(records: &[Record]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        if let Some(cat) = record.category.as_deref() {
            *totals.entry(cat).or_default() += record.value;
        }
    }
    totals
        .into_iter()
        .map(|(cat, total)| (cat.to_string(), total))
        .collect()
}

/// Total value per (year, category), ordered by year then category. Feeds the
/// stacked generation-mix bars.
pub fn yearly_by_category(records: &[Record]) -> Vec<Record> {
    let mut totals: BTreeMap<(i32, Option<&str>), f64> = BTreeMap::new();
    for record in records {
        *totals
            .entry((record.year, record.category.as_deref()))
            .or_default() += record.value;
    }
    totals
        .into_iter()
        .map(|((year, cat), value)| Record::yearly(year, cat, value))
        .collect()
}

/// Inner join of two monthly series on their month.
pub fn join_monthly(left: &[Record], right: &[Record]) -> Vec<(NaiveDate, f64, f64)> {
    let right: BTreeMap<NaiveDate, f64> = right
        .iter()
        .filter_map(|r| r.date.map(|d| (d, r.value)))
        .collect();
    left.iter()
        .filter_map(|l| {
            let date = l.date?;
            right.get(&date).map(|&rv| (date, l.value, rv))
        })
        .collect()
}
