//! ### Clean
//! Drops rows with missing fields and clamps negative measurements to zero.

use tracing::debug;

use crate::record::{Dataset, RawDataset, RawRecord, Record};

/// Returns the rows of `raw` that carry every field the file declares, with
/// the measurement clamped to `max(0, value)`. Order is preserved and `raw`
/// is left untouched.
pub fn clean(raw: &RawDataset) -> Dataset {
    let has_date = raw.columns.has_date;
    let has_category = raw.columns.category.is_some();

    let records: Vec<Record> = raw
        .rows
        .iter()
        .filter_map(|row| clean_row(row, has_date, has_category))
        .collect();

    let dropped = raw.rows.len() - records.len();
    if dropped > 0 {
        debug!("Dropped {dropped} {} rows with missing fields", raw.kind);
    }
    Dataset::new(raw.kind, records)
}

fn clean_row(row: &RawRecord, has_date: bool, has_category: bool) -> Option<Record> {
    if has_date && row.date.is_none() {
        return None;
    }
    if has_category && row.category.is_none() {
        return None;
    }
    Some(Record {
        date: row.date,
        year: row.year?,
        category: row.category.clone(),
        value: row.value?.max(0.),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Columns, DatasetKind, YearRule};
    use chrono::NaiveDate;

    fn raw(date: Option<(i32, u32, u32)>, category: Option<&str>, value: Option<f64>) -> RawRecord {
        let date = date.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap());
        RawRecord {
            date,
            year: date.map(|d| chrono::Datelike::year(&d)),
            category: category.map(str::to_string),
            value,
        }
    }

    fn dated(rows: Vec<RawRecord>) -> RawDataset {
        RawDataset {
            kind: DatasetKind::Water,
            columns: Columns {
                has_date: true,
                year_rule: YearRule::FromDate,
                category: Some("sector".to_string()),
                value: "usage".to_string(),
            },
            rows,
        }
    }

    #[test]
    fn negative_values_are_clamped_not_dropped() {
        let input = dated(vec![
            raw(Some((2020, 1, 1)), Some("Residential"), Some(-5.)),
            raw(Some((2020, 1, 2)), Some("Residential"), Some(7.)),
        ]);
        let out = clean(&input);
        let values: Vec<f64> = out.records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![0., 7.]);
        assert!(out.records.iter().all(|r| r.value >= 0.));
    }

    #[test]
    fn rows_with_nulls_are_dropped_in_order() {
        let input = dated(vec![
            raw(Some((2020, 1, 1)), Some("A"), Some(1.)),
            raw(None, Some("B"), Some(2.)),
            raw(Some((2020, 1, 3)), None, Some(3.)),
            raw(Some((2020, 1, 4)), Some("C"), None),
            raw(Some((2020, 1, 5)), Some("D"), Some(5.)),
        ]);
        let out = clean(&input);
        let cats: Vec<_> = out
            .records
            .iter()
            .map(|r| r.category.as_deref().unwrap())
            .collect();
        assert_eq!(cats, vec!["A", "D"]);
        // Input untouched.
        assert_eq!(input.rows.len(), 5);
    }

    #[test]
    fn yearly_files_without_category_keep_rows() {
        let input = RawDataset {
            kind: DatasetKind::Consumption,
            columns: Columns {
                has_date: false,
                year_rule: YearRule::Column,
                category: None,
                value: "consumption_mwh".to_string(),
            },
            rows: vec![
                RawRecord {
                    date: None,
                    year: Some(2019),
                    category: None,
                    value: Some(400.),
                },
                RawRecord {
                    date: None,
                    year: None,
                    category: None,
                    value: Some(410.),
                },
            ],
        };
        let out = clean(&input);
        assert_eq!(out.records, vec![Record::yearly(2019, None, 400.)]);
    }
}
