//! ### Filter
//! Year-range and category selection over cleaned records.

use crate::record::Record;

/// Records with `min_year <= year <= max_year`, in input order. An inverted
/// range selects nothing.
pub fn filter_by_year(records: &[Record], min_year: i32, max_year: i32) -> Vec<Record> {
    records
        .iter()
        .filter(|r| (min_year..=max_year).contains(&r.year))
        .cloned()
        .collect()
}

/// Smallest and largest year present, or `None` for no records. The
/// dashboards derive the shared slider range from consumption alone.
pub fn year_bounds(records: &[Record]) -> Option<(i32, i32)> {
    let min = records.iter().map(|r| r.year).min()?;
    let max = records.iter().map(|r| r.year).max()?;
    Some((min, max))
}

/// The year range every page filters by. Missing bounds default to the
/// consumption data's own range, whatever dataset is being viewed.
pub fn shared_year_range(
    consumption: &[Record],
    min_year: Option<i32>,
    max_year: Option<i32>,
) -> Option<(i32, i32)> {
    let (lo, hi) = year_bounds(consumption)?;
    Some((min_year.unwrap_or(lo), max_year.unwrap_or(hi)))
}

/// Records whose category is one of `selected`. Exact match, as the values
/// come from the dataset's own category list.
pub fn filter_categories(records: &[Record], selected: &[String]) -> Vec<Record> {
    records
        .iter()
        .filter(|r| {
            r.category
                .as_ref()
                .is_some_and(|cat| selected.iter().any(|s| s == cat))
        })
        .cloned()
        .collect()
}
