//! ### Load
//! Reads dashboard csv exports into typed rows. Headers are normalized
//! (trimmed, lowercased), the year of each row is derived from whichever
//! temporal column the file carries, and rows whose cells fail coercion are
//! skipped and counted instead of aborting the load.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::error::{DataError, Result};
use crate::record::{Columns, DatasetKind, RawDataset, RawRecord, YearRule};

/// Decision table for the year column. The first header present wins.
pub const YEAR_RULES: [(&str, YearRule); 3] = [
    ("year", YearRule::Column),
    ("date", YearRule::FromDate),
    ("period", YearRule::FromPeriod),
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub malformed_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub dataset: RawDataset,
    pub report: LoadReport,
}

/// Positions of the resolved columns within a csv row.
struct ColumnIndex {
    date: Option<usize>,
    year: usize,
    category: Option<usize>,
    value: usize,
}

/// The bundled file for `kind` under `data_dir`. Falls back to the first
/// known name when none exists, so the load reports that path as missing.
pub fn data_file(data_dir: &Path, kind: DatasetKind) -> PathBuf {
    let names = kind.file_names();
    names
        .iter()
        .map(|name| data_dir.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| data_dir.join(names[0]))
}

pub fn load_path(path: &Path, kind: DatasetKind) -> Result<Loaded> {
    info!("Loading {kind} data from {}", path.display());
    let file = File::open(path).map_err(|source| DataError::DataSourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    load_reader(file, kind)
}

/// Loads an uploaded file already held in memory.
pub fn load_bytes(bytes: &[u8], kind: DatasetKind) -> Result<Loaded> {
    info!("Loading {kind} data from {} uploaded bytes", bytes.len());
    load_reader(bytes, kind)
}

pub fn load_reader<R: Read>(reader: R, kind: DatasetKind) -> Result<Loaded> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = normalize_headers(reader.headers()?);
    let (columns, index) = resolve_columns(&headers, kind)?;

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for (line_no, line) in reader.records().enumerate() {
        report.total_rows += 1;
        // Header is line 1.
        let line_no = line_no as u64 + 2;
        let line = match line {
            Ok(line) => line,
            // The reader has consumed the whole row and can carry on.
            Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                debug!("Skipping line {line_no}: {e}");
                report.malformed_rows += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        match parse_row(&line, &index, columns.year_rule, line_no) {
            Ok(row) => rows.push(row),
            Err(e) => {
                debug!("{e}");
                report.malformed_rows += 1;
            }
        }
    }
    report.loaded_rows = rows.len();

    if report.malformed_rows > 0 {
        warn!(
            "Skipped {} malformed rows in {kind} data",
            report.malformed_rows
        );
    }
    info!(
        "Loaded {} of {} {kind} rows",
        report.loaded_rows, report.total_rows
    );

    Ok(Loaded {
        dataset: RawDataset {
            kind,
            columns,
            rows,
        },
        report,
    })
}

pub fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(|h| h.trim().to_lowercase()).collect()
}

/// Picks the year rule for a set of normalized headers.
pub fn resolve_year_rule(headers: &[String], kind: DatasetKind) -> Result<YearRule> {
    YEAR_RULES
        .iter()
        .find(|(column, _)| headers.iter().any(|h| h == column))
        .map(|(_, rule)| *rule)
        .ok_or(DataError::MissingTemporalColumn { dataset: kind })
}

fn position(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn first_alias(headers: &[String], aliases: &[&str]) -> Option<(usize, String)> {
    aliases
        .iter()
        .find_map(|alias| position(headers, alias).map(|idx| (idx, alias.to_string())))
}

fn resolve_columns(headers: &[String], kind: DatasetKind) -> Result<(Columns, ColumnIndex)> {
    let year_rule = resolve_year_rule(headers, kind)?;
    let year_column = match year_rule {
        YearRule::Column => "year",
        YearRule::FromDate => "date",
        YearRule::FromPeriod => "period",
    };
    let year = position(headers, year_column)
        .ok_or(DataError::MissingTemporalColumn { dataset: kind })?;
    let date = position(headers, "date");

    let category = first_alias(headers, kind.category_aliases());
    if category.is_none() && kind.category_required() {
        return Err(DataError::MissingColumn {
            dataset: kind,
            expected: kind.category_aliases(),
        });
    }
    let (value_idx, value_name) =
        first_alias(headers, kind.value_aliases()).ok_or(DataError::MissingColumn {
            dataset: kind,
            expected: kind.value_aliases(),
        })?;

    let columns = Columns {
        has_date: date.is_some(),
        year_rule,
        category: category.as_ref().map(|(_, name)| name.clone()),
        value: value_name,
    };
    let index = ColumnIndex {
        date,
        year,
        category: category.map(|(idx, _)| idx),
        value: value_idx,
    };
    Ok((columns, index))
}

/// Empty and absent cells are both nulls.
fn cell(line: &StringRecord, idx: usize) -> Option<&str> {
    line.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_row(
    line: &StringRecord,
    index: &ColumnIndex,
    rule: YearRule,
    line_no: u64,
) -> Result<RawRecord> {
    let malformed = |reason: String| DataError::MalformedRecord {
        line: line_no,
        reason,
    };

    let date = match index.date.and_then(|idx| cell(line, idx)) {
        Some(raw) => Some(parse_date(raw).ok_or_else(|| malformed(format!("bad date {raw:?}")))?),
        None => None,
    };

    let year = match rule {
        YearRule::FromDate => date.map(|d| d.year()),
        YearRule::Column | YearRule::FromPeriod => match cell(line, index.year) {
            Some(raw) => {
                Some(parse_year(raw).ok_or_else(|| malformed(format!("bad year {raw:?}")))?)
            }
            None => None,
        },
    };

    let value = match cell(line, index.value) {
        Some(raw) => parse_number(raw).ok_or_else(|| malformed(format!("bad value {raw:?}")))?,
        None => None,
    };

    Ok(RawRecord {
        date,
        year,
        category: index
            .category
            .and_then(|idx| cell(line, idx))
            .map(str::to_string),
        value,
    })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .filter(|d| (1..=9999).contains(&d.year()))
}

/// Accepts `2020` as well as `2020.0`, the way spreadsheet exports write
/// whole years.
pub fn parse_year(raw: &str) -> Option<i32> {
    let year = match raw.parse::<i32>() {
        Ok(year) => year,
        Err(_) => {
            let float = raw.parse::<f64>().ok()?;
            if float.fract() != 0. {
                return None;
            }
            float as i32
        }
    };
    (1..=9999).contains(&year).then_some(year)
}

/// `Some(None)` is a NaN cell, which is a null rather than a bad value.
fn parse_number(raw: &str) -> Option<Option<f64>> {
    let num = raw.replace(',', "").parse::<f64>().ok()?;
    if num.is_nan() {
        return Some(None);
    }
    num.is_finite().then_some(Some(num))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn year_rule_prefers_year_then_date_then_period() {
        let kind = DatasetKind::Consumption;
        assert_eq!(
            resolve_year_rule(&headers(&["date", "year"]), kind).unwrap(),
            YearRule::Column
        );
        assert_eq!(
            resolve_year_rule(&headers(&["period", "date"]), kind).unwrap(),
            YearRule::FromDate
        );
        assert_eq!(
            resolve_year_rule(&headers(&["period", "consumption"]), kind).unwrap(),
            YearRule::FromPeriod
        );
        assert!(matches!(
            resolve_year_rule(&headers(&["sector", "consumption"]), kind),
            Err(DataError::MissingTemporalColumn { .. })
        ));
    }

    #[test]
    fn headers_are_trimmed_and_lowercased() {
        let csv = " Date ,SECTOR, Consumption\n2020-01-01,Residential,5\n";
        let loaded = load_bytes(csv.as_bytes(), DatasetKind::Consumption).unwrap();
        assert_eq!(loaded.dataset.columns.value, "consumption");
        assert_eq!(loaded.dataset.columns.category.as_deref(), Some("sector"));
        assert_eq!(loaded.dataset.rows[0].year, Some(2020));
    }

    #[test]
    fn period_column_is_cast_to_year() {
        let csv = "period,consumption_mwh\n2018,400\n2019.0,410\n";
        let loaded = load_bytes(csv.as_bytes(), DatasetKind::Consumption).unwrap();
        let years: Vec<_> = loaded.dataset.rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![Some(2018), Some(2019)]);
        assert_eq!(loaded.dataset.columns.year_rule, YearRule::FromPeriod);
        assert!(!loaded.dataset.columns.has_date);
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let csv = "Date,Sector,Usage\n\
                   2020-01-01,Residential,10\n\
                   not-a-date,Residential,11\n\
                   2020-01-02,Residential,abc\n\
                   2020-01-03,Residential,\"1,234\"\n";
        let loaded = load_bytes(csv.as_bytes(), DatasetKind::Water).unwrap();
        assert_eq!(loaded.report.total_rows, 4);
        assert_eq!(loaded.report.malformed_rows, 2);
        assert_eq!(loaded.report.loaded_rows, 2);
        assert_eq!(loaded.dataset.rows[1].value, Some(1234.));
    }

    #[test]
    fn rows_with_invalid_utf8_are_skipped_and_counted() {
        let mut csv = b"Date,Sector,Usage\n2020-01-01,Residential,10\n".to_vec();
        csv.extend_from_slice(b"2020-01-02,Caf\xE9,11\n");
        csv.extend_from_slice(b"2020-01-03,Commercial,12\n");
        let loaded = load_bytes(&csv, DatasetKind::Water).unwrap();
        assert_eq!(loaded.report.total_rows, 3);
        assert_eq!(loaded.report.malformed_rows, 1);
        assert_eq!(loaded.report.loaded_rows, 2);
        let values: Vec<_> = loaded.dataset.rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![Some(10.), Some(12.)]);
    }

    #[test]
    fn empty_cells_load_as_nulls() {
        let csv = "Date,Source,Emissions\n2020-01-01,,5\n,Energy,6\n2020-01-02,Energy,\n";
        let loaded = load_bytes(csv.as_bytes(), DatasetKind::Co2).unwrap();
        let rows = &loaded.dataset.rows;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].category, None);
        assert_eq!(rows[1].date, None);
        assert_eq!(rows[1].year, None);
        assert_eq!(rows[2].value, None);
    }

    #[test]
    fn missing_required_columns_fail() {
        let csv = "Date,Generation\n2020-01-01,5\n";
        assert!(matches!(
            load_bytes(csv.as_bytes(), DatasetKind::Generation),
            Err(DataError::MissingColumn { .. })
        ));
        let csv = "Date,Sector\n2020-01-01,Residential\n";
        assert!(matches!(
            load_bytes(csv.as_bytes(), DatasetKind::Water),
            Err(DataError::MissingColumn { .. })
        ));
    }

    #[test]
    fn source_type_is_accepted_for_generation() {
        let csv = "year,source_type,generation_mwh\n2020,Renewable,100\n";
        let loaded = load_bytes(csv.as_bytes(), DatasetKind::Generation).unwrap();
        assert_eq!(loaded.dataset.columns.category.as_deref(), Some("source_type"));
        assert_eq!(loaded.dataset.rows[0].value, Some(100.));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = load_path(Path::new("no/such/file.csv"), DatasetKind::Water).unwrap_err();
        assert!(matches!(err, DataError::DataSourceUnavailable { .. }));
    }

    #[test]
    fn data_file_falls_back_to_generation_csv() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            data_file(dir.path(), DatasetKind::Generation),
            dir.path().join("renewable_generation.csv")
        );
        std::fs::write(dir.path().join("generation.csv"), "").unwrap();
        assert_eq!(
            data_file(dir.path(), DatasetKind::Generation),
            dir.path().join("generation.csv")
        );
    }

    #[test]
    fn dates_parse_in_several_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4);
        assert_eq!(parse_date("2021-03-04"), expected);
        assert_eq!(parse_date("2021/03/04"), expected);
        assert_eq!(parse_date("04/03/2021"), expected);
        assert_eq!(parse_date("2021-03-04 12:30:00"), expected);
        assert_eq!(parse_date("2021-03-04T00:00:00"), expected);
        assert_eq!(parse_date("March 4th"), None);
    }

    #[test]
    fn years_outside_range_are_rejected() {
        assert_eq!(parse_year("0"), None);
        assert_eq!(parse_year("10000"), None);
        assert_eq!(parse_year("2020.5"), None);
        assert_eq!(parse_year("9999"), Some(9999));
    }
}
