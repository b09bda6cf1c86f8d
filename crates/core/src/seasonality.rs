//! Calendar-month demand multipliers for marketplace retail.

use chrono::{Datelike, NaiveDate};

const MONTHLY_MULTIPLIERS: [f64; 12] =
    [0.85, 0.90, 0.95, 1.0, 1.0, 0.95, 0.90, 0.95, 1.05, 1.15, 1.4, 1.25];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeasonalityModel;

impl SeasonalityModel {
    /// Multiplier for a 1-based month. Out-of-range months are neutral.
    pub fn multiplier_for_month(&self, month: u32) -> f64 {
        match month {
            1..=12 => MONTHLY_MULTIPLIERS[(month - 1) as usize],
            _ => 1.0,
        }
    }

    pub fn multiplier(&self, date: NaiveDate) -> f64 {
        self.multiplier_for_month(date.month())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::SeasonalityModel;

    #[test]
    fn holiday_months_carry_the_largest_boost() {
        let model = SeasonalityModel;
        assert_eq!(model.multiplier_for_month(11), 1.4);
        assert_eq!(model.multiplier_for_month(12), 1.25);
        assert_eq!(model.multiplier_for_month(1), 0.85);
        assert_eq!(model.multiplier_for_month(7), 0.90);
    }

    #[test]
    fn date_lookup_uses_calendar_month() {
        let model = SeasonalityModel;
        assert_eq!(model.multiplier(NaiveDate::from_ymd_opt(2024, 10, 31).unwrap()), 1.15);
        assert_eq!(model.multiplier(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()), 1.05);
    }

    #[test]
    fn invalid_month_is_neutral() {
        assert_eq!(SeasonalityModel.multiplier_for_month(0), 1.0);
        assert_eq!(SeasonalityModel.multiplier_for_month(13), 1.0);
    }
}
