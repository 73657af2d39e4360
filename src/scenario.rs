//! ### Scenario
//! Illustrative "what-if" scaling of renewable generation. Not a forecast.

use crate::metrics::RenewableSet;
use crate::record::Record;

/// Copy of `records` with every renewable row scaled by
/// `1 + increase_pct / 100`. Any percentage is accepted; negative values
/// shrink generation.
pub fn apply_scenario(
    records: &[Record],
    increase_pct: f64,
    renewable: &RenewableSet,
) -> Vec<Record> {
    let factor = 1. + increase_pct / 100.;
    records
        .iter()
        .map(|r| {
            let mut projected = r.clone();
            if renewable.matches(r) {
                projected.value *= factor;
            }
            projected
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation() -> Vec<Record> {
        vec![
            Record::yearly(2020, Some("Renewable"), 100.),
            Record::yearly(2020, Some("Non-renewable"), 300.),
        ]
    }

    #[test]
    fn zero_percent_is_a_no_op() {
        let input = generation();
        assert_eq!(apply_scenario(&input, 0., &RenewableSet::default()), input);
    }

    #[test]
    fn only_renewable_rows_scale() {
        let input = generation();
        let out = apply_scenario(&input, 20., &RenewableSet::default());
        assert!((out[0].value - 120.).abs() < 1e-9);
        assert_eq!(out[1].value, 300.);
        // Source untouched.
        assert_eq!(input[0].value, 100.);
    }

    #[test]
    fn negative_increase_shrinks() {
        let out = apply_scenario(&generation(), -50., &RenewableSet::default());
        assert_eq!(out[0].value, 50.);
    }
}
