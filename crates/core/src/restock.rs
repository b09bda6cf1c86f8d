use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::seasonality::SeasonalityModel;
use crate::velocity::VelocityResult;

/// Reported coverage when the product has no adjusted demand.
pub const COVERAGE_SENTINEL_DAYS: f64 = 9999.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestockPlan {
    pub suggested_quantity: u64,
    pub current_stock: f64,
    pub adjusted_velocity: f64,
    pub safety_days: u32,
    pub lead_time_days: u32,
    pub estimated_coverage_days: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestockQuantityOptimizer {
    lead_time_days: u32,
    seasonality: SeasonalityModel,
}

impl Default for RestockQuantityOptimizer {
    fn default() -> Self {
        Self::new(30)
    }
}

impl RestockQuantityOptimizer {
    pub fn new(lead_time_days: u32) -> Self {
        Self { lead_time_days, seasonality: SeasonalityModel }
    }

    pub fn lead_time_days(&self) -> u32 {
        self.lead_time_days
    }

    pub fn plan(
        &self,
        velocity: &VelocityResult,
        current_stock: f64,
        target: NaiveDate,
    ) -> RestockPlan {
        let adjusted_velocity = (velocity.weighted_velocity
            * velocity.trend_factor
            * self.seasonality.multiplier(target))
        .max(0.0);
        self.plan_for_velocity(adjusted_velocity, velocity.confidence, current_stock)
    }

    /// Plan from an already adjusted daily demand.
    pub fn plan_for_velocity(
        &self,
        adjusted_velocity: f64,
        confidence: f64,
        current_stock: f64,
    ) -> RestockPlan {
        let current_stock = current_stock.max(0.0);
        let safety_days = safety_days(confidence);
        let total_needed = adjusted_velocity * f64::from(self.lead_time_days + safety_days);
        let suggested_quantity = round_order_quantity(total_needed - current_stock);

        let estimated_coverage_days = if adjusted_velocity > 0.0 {
            (current_stock + suggested_quantity as f64) / adjusted_velocity
        } else {
            COVERAGE_SENTINEL_DAYS
        };

        RestockPlan {
            suggested_quantity,
            current_stock,
            adjusted_velocity,
            safety_days,
            lead_time_days: self.lead_time_days,
            estimated_coverage_days,
        }
    }
}

/// Buffer days shrink as the velocity estimate gets more trustworthy.
pub fn safety_days(confidence: f64) -> u32 {
    if confidence > 0.8 {
        7
    } else if confidence > 0.6 {
        14
    } else {
        21
    }
}

/// Small orders round up to a whole unit, larger ones to the next multiple of five.
pub fn round_order_quantity(raw: f64) -> u64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    if raw < 10.0 {
        raw.ceil() as u64
    } else {
        ((raw / 5.0).ceil() * 5.0) as u64
    }
}
