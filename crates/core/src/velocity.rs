//! Multi-period sales velocity with trend and confidence.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::DailyUnits;
use crate::stats;

/// Trailing windows, in days.
pub const PERIODS: [u32; 5] = [7, 14, 30, 60, 90];

/// Convex weights, most recent window first. Sums to 1.
pub const PERIOD_WEIGHTS: [f64; 5] = [0.4, 0.25, 0.2, 0.1, 0.05];

pub const MAX_TREND_FACTOR: f64 = 10.0;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Accelerating,
    Stable,
    Declining,
}

impl TrendDirection {
    pub fn from_factor(trend_factor: f64) -> Self {
        if trend_factor > 1.2 {
            Self::Accelerating
        } else if trend_factor < 0.8 {
            Self::Declining
        } else {
            Self::Stable
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityResult {
    /// Period length in days to units/day.
    pub period_velocities: BTreeMap<u32, f64>,
    pub weighted_velocity: f64,
    pub trend_factor: f64,
    pub trend_direction: TrendDirection,
    pub confidence: f64,
    /// Units sold on the target date itself.
    pub target_day_units: u64,
    /// True when `weighted_velocity` came from the same-day fallback.
    pub same_day_fallback: bool,
}

impl VelocityResult {
    pub fn velocity(&self, period: u32) -> f64 {
        self.period_velocities.get(&period).copied().unwrap_or(0.0)
    }

    /// A result with no sales at all.
    pub fn zero() -> Self {
        Self {
            period_velocities: PERIODS.iter().map(|period| (*period, 0.0)).collect(),
            weighted_velocity: 0.0,
            trend_factor: 1.0,
            trend_direction: TrendDirection::Stable,
            confidence: DEFAULT_CONFIDENCE,
            target_day_units: 0,
            same_day_fallback: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VelocityCalculator {
    /// When false, each window is the `p` days ending the day before the target
    /// date; when true it is `[target - p + 1, target]`.
    include_target_day: bool,
}

impl VelocityCalculator {
    pub fn new(include_target_day: bool) -> Self {
        Self { include_target_day }
    }

    pub fn calculate(&self, daily: &DailyUnits, target: NaiveDate) -> VelocityResult {
        let window_end = if self.include_target_day { target } else { target - Duration::days(1) };
        let target_day_units = daily.units_on(target);

        let period_velocities: BTreeMap<u32, f64> = PERIODS
            .iter()
            .map(|period| {
                let start = window_end - Duration::days(i64::from(*period) - 1);
                let units = daily.units_between(start, window_end);
                (*period, units as f64 / f64::from(*period))
            })
            .collect();
        let ordered: Vec<f64> = PERIODS.iter().map(|period| period_velocities[period]).collect();

        let mut weighted_velocity: f64 =
            ordered.iter().zip(PERIOD_WEIGHTS).map(|(velocity, weight)| velocity * weight).sum();
        let mut same_day_fallback = false;
        if ordered.iter().all(|velocity| *velocity == 0.0) && target_day_units > 0 {
            weighted_velocity = target_day_units as f64;
            same_day_fallback = true;
        }

        let trend_factor = trend_factor(&ordered);

        VelocityResult {
            period_velocities,
            weighted_velocity,
            trend_factor,
            trend_direction: TrendDirection::from_factor(trend_factor),
            confidence: confidence(&ordered),
            target_day_units,
            same_day_fallback,
        }
    }
}

/// avg(v7, v14) / avg(v60, v90), clamped to [0, 10]; 1.0 without history.
fn trend_factor(ordered: &[f64]) -> f64 {
    let recent = (ordered[0] + ordered[1]) / 2.0;
    let historical = (ordered[3] + ordered[4]) / 2.0;
    stats::safe_ratio(recent, historical)
        .map(|ratio| ratio.clamp(0.0, MAX_TREND_FACTOR))
        .unwrap_or(1.0)
}

/// 1 - coefficient of variation across the non-zero windows.
fn confidence(ordered: &[f64]) -> f64 {
    let nonzero: Vec<f64> = ordered.iter().copied().filter(|velocity| *velocity > 0.0).collect();
    if nonzero.len() < 2 {
        return DEFAULT_CONFIDENCE;
    }
    stats::coefficient_of_variation(&nonzero)
        .map(|cv| (1.0 - cv).clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE)
}
