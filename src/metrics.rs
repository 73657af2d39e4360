//! ### Metrics
//! Scalar summaries shown on the overview page.

use crate::record::Record;

/// Category names counted as renewable generation. Matching is trimmed and
/// case-insensitive, for both the share metric and scenario projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewableSet {
    names: Vec<String>,
}

impl RenewableSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        let category = category.trim().to_lowercase();
        self.names.iter().any(|n| *n == category)
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.category.as_deref().is_some_and(|c| self.contains(c))
    }
}

impl Default for RenewableSet {
    /// Uploaded generation files tag rows with a `source_type` of `renewable`
    /// or `non-renewable`; bundled ones name the source itself.
    fn default() -> Self {
        Self::new([
            "renewable",
            "solar",
            "wind",
            "hydro",
            "tidal",
            "biomass",
            "geothermal",
        ])
    }
}

/// Sum of values, 0 for no records.
pub fn total(records: &[Record]) -> f64 {
    records.iter().map(|r| r.value).sum()
}

pub fn total_consumption(consumption: &[Record]) -> f64 {
    total(consumption)
}

pub fn total_generation(generation: &[Record]) -> f64 {
    total(generation)
}

pub fn total_water(water: &[Record]) -> f64 {
    total(water)
}

pub fn total_co2(co2: &[Record]) -> f64 {
    total(co2)
}

/// Percentage of generation from renewable categories. Defined as 0 when
/// total generation is 0.
pub fn renewable_share(generation: &[Record], renewable: &RenewableSet) -> f64 {
    let all = total(generation);
    if all == 0. {
        return 0.;
    }
    let green: f64 = generation
        .iter()
        .filter(|r| renewable.matches(r))
        .map(|r| r.value)
        .sum();
    100. * green / all
}

/// Generation as a percentage of consumption, to 2 decimal places. 0 when
/// there is no consumption.
pub fn renewable_coverage(consumption: &[Record], generation: &[Record]) -> f64 {
    let used = total(consumption);
    if used == 0. {
        return 0.;
    }
    round_dp(100. * total(generation) / used, 2)
}

pub fn round_dp(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation() -> Vec<Record> {
        vec![
            Record::yearly(2020, Some("Solar"), 100.),
            Record::yearly(2020, Some("Wind"), 50.),
            Record::yearly(2020, Some("Coal"), 200.),
        ]
    }

    #[test]
    fn share_of_tagged_sources() {
        let share = renewable_share(&generation(), &RenewableSet::new(["Solar", "Wind"]));
        assert!((share - 150. / 350. * 100.).abs() < 1e-9);
        assert_eq!(round_dp(share, 2), 42.86);
    }

    #[test]
    fn share_is_zero_without_generation() {
        assert_eq!(renewable_share(&[], &RenewableSet::default()), 0.);
        let zeros = vec![Record::yearly(2020, Some("renewable"), 0.)];
        assert_eq!(renewable_share(&zeros, &RenewableSet::default()), 0.);
    }

    #[test]
    fn category_match_ignores_case() {
        let records = vec![
            Record::yearly(2020, Some("Renewable"), 30.),
            Record::yearly(2020, Some(" renewable "), 10.),
            Record::yearly(2020, Some("Non-renewable"), 60.),
        ];
        assert_eq!(renewable_share(&records, &RenewableSet::default()), 40.);
    }

    #[test]
    fn default_set_knows_sources_and_tags() {
        let set = RenewableSet::default();
        assert!(set.contains("Solar"));
        assert!(set.contains("RENEWABLE"));
        assert!(!set.contains("Non-renewable"));
        assert!(!set.contains("Coal"));
    }

    #[test]
    fn totals_of_empty_are_zero() {
        assert_eq!(total(&[]), 0.);
        assert_eq!(total_co2(&[]), 0.);
        assert_eq!(total_water(&[]), 0.);
    }

    #[test]
    fn coverage_rounds_and_guards_zero() {
        let consumption = vec![Record::yearly(2020, None, 300.)];
        let gen = vec![Record::yearly(2020, Some("Wind"), 100.)];
        assert_eq!(renewable_coverage(&consumption, &gen), 33.33);
        assert_eq!(renewable_coverage(&[], &gen), 0.);
    }
}
