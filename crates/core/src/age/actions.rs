use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{AgeCategory, AgeEstimate};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgeAction {
    pub asin: String,
    pub title: String,
    pub estimated_age_days: u32,
    pub category: AgeCategory,
    pub current_stock: f64,
    pub daily_velocity: f64,
    pub score: f64,
    pub action: String,
}

impl AgeAction {
    /// `None` for products that are not aged enough to act on.
    pub fn from_estimate(
        asin: &str,
        title: &str,
        estimate: &AgeEstimate,
        current_stock: f64,
        daily_velocity: f64,
    ) -> Option<Self> {
        let age = estimate.estimated_age_days?;
        let score = action_score(estimate.category, age, current_stock, daily_velocity)?;
        Some(Self {
            asin: asin.to_string(),
            title: title.to_string(),
            estimated_age_days: age,
            category: estimate.category,
            current_stock,
            daily_velocity,
            score,
            action: recommended_action(estimate.category, daily_velocity).to_string(),
        })
    }
}

/// base(category) x stock multiplier x velocity factor x time pressure.
pub fn action_score(
    category: AgeCategory,
    age_days: u32,
    current_stock: f64,
    daily_velocity: f64,
) -> Option<f64> {
    let base = match category {
        AgeCategory::Aged => 0.3,
        AgeCategory::Old => 0.6,
        AgeCategory::Ancient => 1.0,
        _ => return None,
    };
    let stock_multiplier = 1.0 + (current_stock.max(0.0) / 100.0).min(2.0);
    let velocity_factor = if daily_velocity <= 0.0 {
        1.5
    } else if daily_velocity < 1.0 {
        1.2
    } else {
        1.0
    };
    let time_pressure = match age_days {
        366.. => 1.5,
        271..=365 => 1.3,
        181..=270 => 1.1,
        _ => 1.0,
    };
    Some(base * stock_multiplier * velocity_factor * time_pressure)
}

fn recommended_action(category: AgeCategory, daily_velocity: f64) -> &'static str {
    match category {
        AgeCategory::Ancient => "Liquidate or create a removal order",
        AgeCategory::Old if daily_velocity <= 0.0 => "Clearance price; no recent sales",
        AgeCategory::Old => "Clearance price and pause reorders",
        _ if daily_velocity <= 0.0 => "Promote to restart sales",
        _ => "Promote and reduce the next reorder",
    }
}

/// Highest score first; ties by ASIN so the order is stable.
pub fn rank_age_actions(actions: &mut [AgeAction]) {
    actions.sort_by(|a, b| {
        b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then_with(|| a.asin.cmp(&b.asin))
    });
}
