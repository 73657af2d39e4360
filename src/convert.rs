//! ### Convert
//! Writes computed series back out as csvs, so the numbers behind each
//! chart can be inspected or charted elsewhere.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

use crate::record::{DatasetKind, Record};

#[derive(Serialize)]
struct MonthlyCsvRow {
    date: String,
    value: f64,
}

#[derive(Serialize)]
struct CategoryCsvRow<'a> {
    category: &'a str,
    value: f64,
}

#[derive(Serialize)]
struct JoinedCsvRow {
    date: String,
    left: f64,
    right: f64,
}

fn writer(output: &Path, header: &[&str]) -> anyhow::Result<csv::Writer<std::fs::File>> {
    // Headers depend on the dataset, so they are written by hand.
    let mut out_csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output)?;
    out_csv.write_record(header)?;
    Ok(out_csv)
}

/// Output of `aggregate::aggregate_monthly`: one `Date,<value>` row per month.
pub fn write_monthly(output: &Path, kind: DatasetKind, months: &[Record]) -> anyhow::Result<()> {
    let mut out_csv = writer(output, &["Date", kind.value_label()])?;
    for month in months {
        let Some(date) = month.date else {
            anyhow::bail!("Monthly row without a date: {month:?}");
        };
        out_csv.serialize(MonthlyCsvRow {
            date: date.to_string(),
            value: month.value,
        })?;
    }
    out_csv.flush()?;
    Ok(())
}

pub fn write_category_totals(
    output: &Path,
    kind: DatasetKind,
    totals: &[(String, f64)],
) -> anyhow::Result<()> {
    let mut out_csv = writer(output, &[kind.category_label(), kind.value_label()])?;
    for (category, value) in totals {
        out_csv.serialize(CategoryCsvRow {
            category,
            value: *value,
        })?;
    }
    out_csv.flush()?;
    Ok(())
}

/// Consumption against generation per month, as charted on the overview.
pub fn write_joined_monthly(
    output: &Path,
    joined: &[(NaiveDate, f64, f64)],
) -> anyhow::Result<()> {
    let mut out_csv = writer(
        output,
        &[
            "Date",
            DatasetKind::Consumption.value_label(),
            DatasetKind::Generation.value_label(),
        ],
    )?;
    for &(date, left, right) in joined {
        out_csv.serialize(JoinedCsvRow {
            date: date.to_string(),
            left,
            right,
        })?;
    }
    out_csv.flush()?;
    Ok(())
}
