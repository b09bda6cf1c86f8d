//! Small numeric helpers shared by the analytics modules.

/// Maps NaN/Infinity to `None` so undefined ratios serialize as `null`.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Ratio with an explicit guard for a zero (or non-finite) denominator.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator.abs() <= f64::EPSILON {
        return None;
    }
    finite(numerator / denominator)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    finite(variance.sqrt())
}

/// `std_dev / mean`; `None` when the mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    safe_ratio(std_dev(values)?, mean(values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_filters_nan_and_infinity() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::NEG_INFINITY), None);
    }

    #[test]
    fn safe_ratio_guards_zero_denominator() {
        assert_eq!(safe_ratio(4.0, 0.0), None);
        assert_eq!(safe_ratio(4.0, 2.0), Some(2.0));
    }

    #[test]
    fn population_std_dev_matches_hand_computation() {
        // mean 5, squared deviations 9+1+1+9 = 20, /4 = 5
        let sd = std_dev(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((sd - 5.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_input_has_no_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[]), None);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
    }
}
