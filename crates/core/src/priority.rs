//! Restock priority: how soon a product runs out (urgency) times how much
//! demand a restock would capture (opportunity).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::StockRecord;
use crate::seasonality::SeasonalityModel;
use crate::velocity::{TrendDirection, VelocityResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityCategory {
    CriticalHighVelocity,
    CriticalLowVelocity,
    WarningHighVelocity,
    WarningModerate,
    OpportunityHighVelocity,
    Monitor,
    LowPriority,
    NoVelocity,
}

impl PriorityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalHighVelocity => "critical_high_velocity",
            Self::CriticalLowVelocity => "critical_low_velocity",
            Self::WarningHighVelocity => "warning_high_velocity",
            Self::WarningModerate => "warning_moderate",
            Self::OpportunityHighVelocity => "opportunity_high_velocity",
            Self::Monitor => "monitor",
            Self::LowPriority => "low_priority",
            Self::NoVelocity => "no_velocity",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Self::CriticalHighVelocity | Self::CriticalLowVelocity)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::WarningHighVelocity | Self::WarningModerate)
    }

    /// Critical and warning products are restock candidates.
    pub fn is_actionable(&self) -> bool {
        self.is_critical() || self.is_warning()
    }
}

impl fmt::Display for PriorityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorityResult {
    pub score: f64,
    pub category: PriorityCategory,
    pub urgency: f64,
    pub opportunity: f64,
    pub reasoning: String,
}

/// Urgency when stock covers fewer than this many days of sales.
const COVER_CRITICAL_DAYS: f64 = 3.0;
const COVER_WARNING_DAYS: f64 = 7.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct PriorityScorer {
    seasonality: SeasonalityModel,
}

impl PriorityScorer {
    pub fn new(seasonality: SeasonalityModel) -> Self {
        Self { seasonality }
    }

    pub fn score(
        &self,
        velocity: &VelocityResult,
        stock: &StockRecord,
        target: NaiveDate,
    ) -> PriorityResult {
        let weighted = velocity.weighted_velocity;
        let seasonal = self.seasonality.multiplier(target);
        let urgency = urgency(weighted, stock.current_stock, stock.days_left);
        let opportunity = weighted * velocity.trend_factor * seasonal;
        let score = urgency * (1.0 + opportunity);
        let category = categorize(urgency, opportunity, weighted, stock.current_stock);

        PriorityResult {
            score,
            category,
            urgency,
            opportunity,
            reasoning: reasoning(velocity, stock, seasonal),
        }
    }
}

/// Stock-out urgency in [0, 1].
pub fn urgency(weighted_velocity: f64, current_stock: f64, days_left: f64) -> f64 {
    if current_stock <= 0.0 && weighted_velocity > 0.0 {
        return 1.0;
    }
    if current_stock <= weighted_velocity * COVER_CRITICAL_DAYS {
        return 1.0;
    }
    if current_stock <= weighted_velocity * COVER_WARNING_DAYS {
        return 0.8;
    }
    days_left_urgency(days_left)
}

/// Urgency from the sheet's own days-left figure.
pub fn days_left_urgency(days_left: f64) -> f64 {
    if days_left <= 3.0 {
        1.0
    } else if days_left <= 7.0 {
        0.8
    } else if days_left <= 14.0 {
        0.6
    } else if days_left <= 30.0 {
        0.3
    } else {
        0.1
    }
}

/// First matching rule wins.
pub fn categorize(
    urgency: f64,
    opportunity: f64,
    weighted_velocity: f64,
    current_stock: f64,
) -> PriorityCategory {
    if weighted_velocity == 0.0 {
        PriorityCategory::NoVelocity
    } else if current_stock <= 0.0 && weighted_velocity > 0.0 {
        if opportunity >= 1.0 {
            PriorityCategory::CriticalHighVelocity
        } else {
            PriorityCategory::CriticalLowVelocity
        }
    } else if urgency >= 0.8 && opportunity >= 1.0 {
        PriorityCategory::CriticalHighVelocity
    } else if urgency >= 0.8 {
        PriorityCategory::CriticalLowVelocity
    } else if urgency >= 0.6 && opportunity >= 1.0 {
        PriorityCategory::WarningHighVelocity
    } else if urgency >= 0.6 {
        PriorityCategory::WarningModerate
    } else if opportunity >= 2.0 {
        PriorityCategory::OpportunityHighVelocity
    } else if urgency >= 0.3 || opportunity >= 0.5 {
        PriorityCategory::Monitor
    } else {
        PriorityCategory::LowPriority
    }
}

fn reasoning(velocity: &VelocityResult, stock: &StockRecord, seasonal: f64) -> String {
    let weighted = velocity.weighted_velocity;
    let mut parts = Vec::new();

    if stock.current_stock <= 0.0 {
        parts.push("Out of stock".to_string());
    } else if weighted > 0.0 {
        parts.push(format!(
            "{:.0} units on hand, about {:.1} days of cover",
            stock.current_stock,
            stock.current_stock / weighted
        ));
    } else {
        parts.push(format!("{:.0} units on hand", stock.current_stock));
    }

    if velocity.same_day_fallback {
        parts.push(format!("Selling {weighted:.2} units/day (today's sales only)"));
    } else {
        parts.push(format!("Selling {weighted:.2} units/day"));
    }

    if (velocity.trend_factor - 1.0).abs() > 0.2 {
        let label = match velocity.trend_direction {
            TrendDirection::Accelerating => "accelerating",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "shifting",
        };
        parts.push(format!("Sales {label} (trend x{:.2})", velocity.trend_factor));
    }

    if (seasonal - 1.0).abs() > 0.1 {
        let label = if seasonal > 1.0 { "Seasonal demand boost" } else { "Seasonal slowdown" };
        parts.push(format!("{label} (x{seasonal:.2})"));
    }

    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::velocity::{TrendDirection, VelocityResult};

    fn velocity(weighted: f64, trend_factor: f64) -> VelocityResult {
        VelocityResult {
            weighted_velocity: weighted,
            trend_factor,
            trend_direction: TrendDirection::from_factor(trend_factor),
            ..VelocityResult::zero()
        }
    }

    fn stock(current_stock: f64, days_left: f64) -> StockRecord {
        StockRecord { current_stock, days_left, ..StockRecord::missing("B0PRIORITY") }
    }

    fn on(month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, 15).unwrap()
    }

    #[test]
    fn out_of_stock_with_demand_is_always_critical() {
        let scorer = PriorityScorer::default();
        let result = scorer.score(&velocity(5.0, 1.0), &stock(0.0, 9999.0), on(4));

        assert_eq!(result.urgency, 1.0);
        assert_eq!(result.category, PriorityCategory::CriticalHighVelocity);

        let slow = scorer.score(&velocity(0.2, 1.0), &stock(0.0, 9999.0), on(4));
        assert_eq!(slow.category, PriorityCategory::CriticalLowVelocity);
    }

    #[test]
    fn stock_cover_drives_urgency_before_days_left() {
        assert_eq!(urgency(2.0, 6.0, 9999.0), 1.0);
        assert_eq!(urgency(2.0, 14.0, 9999.0), 0.8);
        assert_eq!(urgency(2.0, 100.0, 10.0), 0.6);
        assert_eq!(urgency(2.0, 100.0, 9999.0), 0.1);
    }

    #[test]
    fn empty_shelf_without_sales_is_still_fully_covered_by_zero() {
        assert_eq!(urgency(0.0, 0.0, 9999.0), 1.0);
        assert_eq!(urgency(0.0, 5.0, 9999.0), 0.1);
        assert_eq!(urgency(0.0, 5.0, 5.0), 0.8);
    }

    #[test]
    fn days_left_thresholds_are_inclusive() {
        assert_eq!(days_left_urgency(3.0), 1.0);
        assert_eq!(days_left_urgency(7.0), 0.8);
        assert_eq!(days_left_urgency(14.0), 0.6);
        assert_eq!(days_left_urgency(30.0), 0.3);
        assert_eq!(days_left_urgency(30.5), 0.1);
    }

    #[test]
    fn zero_velocity_is_classified_first() {
        assert_eq!(categorize(1.0, 0.0, 0.0, 0.0), PriorityCategory::NoVelocity);
        assert_eq!(categorize(1.0, 5.0, 0.0, 50.0), PriorityCategory::NoVelocity);
    }

    #[test]
    fn cascade_follows_urgency_then_opportunity() {
        assert_eq!(categorize(0.8, 1.0, 1.0, 10.0), PriorityCategory::CriticalHighVelocity);
        assert_eq!(categorize(0.8, 0.9, 1.0, 10.0), PriorityCategory::CriticalLowVelocity);
        assert_eq!(categorize(0.6, 1.0, 1.0, 10.0), PriorityCategory::WarningHighVelocity);
        assert_eq!(categorize(0.6, 0.2, 1.0, 10.0), PriorityCategory::WarningModerate);
        assert_eq!(categorize(0.1, 2.0, 1.0, 10.0), PriorityCategory::OpportunityHighVelocity);
        assert_eq!(categorize(0.3, 0.1, 1.0, 10.0), PriorityCategory::Monitor);
        assert_eq!(categorize(0.1, 0.5, 1.0, 10.0), PriorityCategory::Monitor);
        assert_eq!(categorize(0.1, 0.1, 1.0, 10.0), PriorityCategory::LowPriority);
    }

    #[test]
    fn november_outscores_july() {
        let scorer = PriorityScorer::default();
        let velocity = velocity(2.0, 1.1);
        let stock = stock(40.0, 20.0);

        let november = scorer.score(&velocity, &stock, on(11));
        let july = scorer.score(&velocity, &stock, on(7));

        assert!(november.opportunity > july.opportunity);
        assert!(november.score >= july.score);
    }

    #[test]
    fn score_is_urgency_times_one_plus_opportunity() {
        let scorer = PriorityScorer::default();
        let result = scorer.score(&velocity(1.0, 1.0), &stock(100.0, 10.0), on(4));

        // April multiplier is 1.0: opportunity = 1.0, urgency from days-left 10 = 0.6
        assert!((result.opportunity - 1.0).abs() < 1e-12);
        assert!((result.score - 1.2).abs() < 1e-12);
        assert_eq!(result.category, PriorityCategory::WarningHighVelocity);
    }

    #[test]
    fn reasoning_mentions_trend_and_season_only_when_significant() {
        let scorer = PriorityScorer::default();

        let quiet = scorer.score(&velocity(1.0, 1.1), &stock(100.0, 50.0), on(4));
        assert!(!quiet.reasoning.contains("trend"));
        assert!(!quiet.reasoning.contains("Seasonal"));

        let loud = scorer.score(&velocity(1.0, 2.0), &stock(0.0, 50.0), on(11));
        assert!(loud.reasoning.contains("Out of stock"));
        assert!(loud.reasoning.contains("accelerating"));
        assert!(loud.reasoning.contains("Seasonal demand boost"));
    }
}
