//! ### Record
//! Row and dataset types shared by every stage of the pipeline, plus the
//! per-dataset schema describing which csv columns feed them.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// The four datasets the dashboards chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum DatasetKind {
    Consumption,
    Generation,
    Water,
    Co2,
}

impl DatasetKind {
    /// Normalized (lowercase) header names accepted for the category column,
    /// in order of preference.
    pub fn category_aliases(self) -> &'static [&'static str] {
        match self {
            DatasetKind::Consumption | DatasetKind::Water => &["sector"],
            DatasetKind::Generation => &["source", "source_type"],
            DatasetKind::Co2 => &["source"],
        }
    }

    /// Normalized header names accepted for the measurement column.
    pub fn value_aliases(self) -> &'static [&'static str] {
        match self {
            DatasetKind::Consumption => &["consumption", "consumption_mwh"],
            DatasetKind::Generation => &["generation", "generation_mwh"],
            DatasetKind::Water => &["usage"],
            DatasetKind::Co2 => &["emissions"],
        }
    }

    /// Yearly consumption exports carry no sector breakdown.
    pub fn category_required(self) -> bool {
        !matches!(self, DatasetKind::Consumption)
    }

    /// Bundled file names, first match wins.
    pub fn file_names(self) -> &'static [&'static str] {
        match self {
            DatasetKind::Consumption => &["energy_consumption.csv"],
            DatasetKind::Generation => &["renewable_generation.csv", "generation.csv"],
            DatasetKind::Water => &["water_usage.csv"],
            DatasetKind::Co2 => &["co2_emissions.csv"],
        }
    }

    /// Column label used in exported csvs and chart axes.
    pub fn value_label(self) -> &'static str {
        match self {
            DatasetKind::Consumption => "Consumption",
            DatasetKind::Generation => "Generation",
            DatasetKind::Water => "Usage",
            DatasetKind::Co2 => "Emissions",
        }
    }

    pub fn category_label(self) -> &'static str {
        match self {
            DatasetKind::Consumption | DatasetKind::Water => "Sector",
            DatasetKind::Generation | DatasetKind::Co2 => "Source",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::Consumption => "energy consumption",
            DatasetKind::Generation => "renewable generation",
            DatasetKind::Water => "water usage",
            DatasetKind::Co2 => "CO2 emissions",
        };
        f.write_str(name)
    }
}

/// How the `year` of each row is obtained. Chosen once per file from its
/// headers, see `load::YEAR_RULES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearRule {
    /// A `year` column is present and cast directly.
    Column,
    /// Calendar year of the `date` column.
    FromDate,
    /// Integer cast of the `period` column.
    FromPeriod,
}

/// Which fields a loaded file actually carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub has_date: bool,
    pub year_rule: YearRule,
    pub category: Option<String>,
    pub value: String,
}

/// A row as read from disk. `None` marks an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub value: Option<f64>,
}

/// Output of the loader, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    pub kind: DatasetKind,
    pub columns: Columns,
    pub rows: Vec<RawRecord>,
}

/// A cleaned row. `date` is `None` only for datasets keyed by year or period,
/// `category` is `None` only for datasets without a category column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: Option<NaiveDate>,
    pub year: i32,
    pub category: Option<String>,
    pub value: f64,
}

impl Record {
    pub fn new(date: NaiveDate, category: &str, value: f64) -> Self {
        Self {
            date: Some(date),
            year: date.year(),
            category: Some(category.to_string()),
            value,
        }
    }

    pub fn yearly(year: i32, category: Option<&str>, value: f64) -> Self {
        Self {
            date: None,
            year,
            category: category.map(str::to_string),
            value,
        }
    }
}

/// A cleaned dataset ready for filtering, aggregation and metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(kind: DatasetKind, records: Vec<Record>) -> Self {
        Self { kind, records }
    }

    /// Distinct categories in first-seen order, the options of a multiselect.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for cat in self.records.iter().filter_map(|r| r.category.as_ref()) {
            if !seen.contains(cat) {
                seen.push(cat.clone());
            }
        }
        seen
    }

    pub fn has_dates(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.date.is_some())
    }

    /// Same kind, different rows.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            kind: self.kind,
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let ds = Dataset::new(
            DatasetKind::Water,
            vec![
                Record::new(day(2020, 1, 1), "Residential", 1.),
                Record::new(day(2020, 1, 1), "Commercial", 2.),
                Record::new(day(2020, 1, 2), "Residential", 3.),
            ],
        );
        assert_eq!(ds.categories(), vec!["Residential", "Commercial"]);
    }

    #[test]
    fn record_new_derives_year() {
        let r = Record::new(day(2019, 12, 31), "Solar", 4.);
        assert_eq!(r.year, 2019);
    }

    #[test]
    fn yearly_datasets_have_no_dates() {
        let ds = Dataset::new(
            DatasetKind::Consumption,
            vec![Record::yearly(2020, None, 10.)],
        );
        assert!(!ds.has_dates());
    }
}
