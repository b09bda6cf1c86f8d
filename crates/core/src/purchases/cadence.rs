//! Reorder cadence: how often a product is bought and whether the next buy is overdue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PurchaseRecord;
use crate::stats;

/// days_since / avg_interval at which time urgency starts to rise.
const RAMP_START: f64 = 1.0;
/// Ratio at which time urgency saturates.
const RAMP_END: f64 = 1.5;
const TREND_WEIGHT: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Critical
        } else if score >= 60.0 {
            Self::High
        } else if score >= 40.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CadenceMetrics {
    pub total_purchases: usize,
    pub total_quantity: f64,
    pub avg_quantity_per_purchase: f64,
    /// Undefined with a single purchase.
    pub avg_days_between_purchases: Option<f64>,
    pub days_since_last_purchase: i64,
    pub last_purchase_date: NaiveDate,
    /// Relative change in purchase size, recent half against older half.
    pub purchase_trend: f64,
}

impl CadenceMetrics {
    /// `purchases` must be non-empty and sorted by date.
    pub fn from_purchases(purchases: &[&PurchaseRecord], as_of: NaiveDate) -> Option<Self> {
        let first = purchases.first()?;
        let last = purchases.last()?;
        let quantities: Vec<f64> =
            purchases.iter().map(|purchase| purchase.quantity_purchased).collect();
        let total_quantity: f64 = quantities.iter().sum();
        let count = purchases.len();

        let avg_days_between_purchases = if count > 1 {
            let span = (last.date - first.date).num_days() as f64;
            Some(span / (count - 1) as f64)
        } else {
            None
        };

        Some(Self {
            total_purchases: count,
            total_quantity,
            avg_quantity_per_purchase: total_quantity / count as f64,
            avg_days_between_purchases,
            days_since_last_purchase: (as_of - last.date).num_days(),
            last_purchase_date: last.date,
            purchase_trend: purchase_trend(&quantities),
        })
    }

    pub fn urgency(&self) -> PurchaseUrgency {
        let interval = self.avg_days_between_purchases.filter(|interval| *interval > 0.0);
        let time_urgency = interval
            .map(|interval| time_urgency(self.days_since_last_purchase as f64 / interval))
            .unwrap_or(0.0);
        let trend_adjustment = self.purchase_trend.clamp(-1.0, 1.0) * TREND_WEIGHT;
        let score = (time_urgency + trend_adjustment).clamp(0.0, 100.0);

        let mut reasons = Vec::new();
        match interval {
            Some(interval) => reasons.push(format!(
                "last purchase {} days ago against a {:.1}-day cycle",
                self.days_since_last_purchase, interval
            )),
            None => reasons.push(format!(
                "last purchase {} days ago, no reorder cycle yet",
                self.days_since_last_purchase
            )),
        }
        if self.purchase_trend.abs() >= 0.1 {
            let direction = if self.purchase_trend > 0.0 { "growing" } else { "shrinking" };
            reasons.push(format!(
                "order sizes {direction} {:.0}%",
                self.purchase_trend.abs() * 100.0
            ));
        }

        PurchaseUrgency {
            score,
            level: UrgencyLevel::from_score(score),
            time_urgency,
            trend_adjustment,
            reason: reasons.join("; "),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseUrgency {
    pub score: f64,
    pub level: UrgencyLevel,
    pub time_urgency: f64,
    pub trend_adjustment: f64,
    pub reason: String,
}

/// Linear ramp from 0 at one full interval to 100 at one and a half.
pub fn time_urgency(overdue_ratio: f64) -> f64 {
    if !overdue_ratio.is_finite() || overdue_ratio <= RAMP_START {
        0.0
    } else if overdue_ratio >= RAMP_END {
        100.0
    } else {
        (overdue_ratio - RAMP_START) / (RAMP_END - RAMP_START) * 100.0
    }
}

/// Split-in-half comparison of purchase quantities; 0 with fewer than three purchases.
pub fn purchase_trend(quantities: &[f64]) -> f64 {
    if quantities.len() < 3 {
        return 0.0;
    }
    let (older, recent) = quantities.split_at(quantities.len() / 2);
    match (stats::mean(older), stats::mean(recent)) {
        (Some(older), Some(recent)) => {
            stats::safe_ratio(recent - older, older).and_then(stats::finite).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn purchase(date: &str, quantity: f64) -> PurchaseRecord {
        PurchaseRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            asin: "B0CADENCE".to_string(),
            quantity_purchased: quantity,
            cogs: None,
            sale_price: None,
            units_per_bundle: 1,
            source_link: None,
        }
    }

    fn metrics(records: &[PurchaseRecord], as_of: &str) -> CadenceMetrics {
        let refs: Vec<&PurchaseRecord> = records.iter().collect();
        let as_of = NaiveDate::parse_from_str(as_of, "%Y-%m-%d").unwrap();
        CadenceMetrics::from_purchases(&refs, as_of).unwrap()
    }

    #[test]
    fn single_purchase_has_no_interval_and_no_time_urgency() {
        let metrics = metrics(&[purchase("2024-01-01", 10.0)], "2024-06-01");

        assert_eq!(metrics.avg_days_between_purchases, None);
        assert_eq!(metrics.purchase_trend, 0.0);
        let urgency = metrics.urgency();
        assert_eq!(urgency.score, 0.0);
        assert_eq!(urgency.level, UrgencyLevel::Low);
    }

    #[test]
    fn interval_is_span_over_gaps() {
        let records = [
            purchase("2024-01-01", 10.0),
            purchase("2024-01-31", 10.0),
            purchase("2024-03-01", 10.0),
        ];
        let metrics = metrics(&records, "2024-03-11");

        assert_eq!(metrics.total_purchases, 3);
        assert_eq!(metrics.total_quantity, 30.0);
        assert_eq!(metrics.avg_days_between_purchases, Some(30.0));
        assert_eq!(metrics.days_since_last_purchase, 10);
    }

    #[test]
    fn time_urgency_ramps_between_one_and_one_and_a_half_intervals() {
        assert_eq!(time_urgency(0.5), 0.0);
        assert_eq!(time_urgency(1.0), 0.0);
        assert!((time_urgency(1.25) - 50.0).abs() < 1e-9);
        assert_eq!(time_urgency(1.5), 100.0);
        assert_eq!(time_urgency(4.0), 100.0);
    }

    #[test]
    fn overdue_growing_product_is_critical() {
        let records = [
            purchase("2024-01-01", 10.0),
            purchase("2024-01-31", 20.0),
            purchase("2024-03-01", 20.0),
        ];
        let urgency = metrics(&records, "2024-04-30").urgency();

        assert_eq!(urgency.level, UrgencyLevel::Critical);
        assert_eq!(urgency.score, 100.0);
        assert!(urgency.reason.contains("growing"));
    }

    #[test]
    fn shrinking_orders_pull_urgency_down() {
        let records = [
            purchase("2024-01-01", 40.0),
            purchase("2024-01-31", 10.0),
            purchase("2024-03-01", 10.0),
        ];
        let metrics = metrics(&records, "2024-04-07");

        assert!((metrics.purchase_trend + 0.75).abs() < 1e-9);
        let urgency = metrics.urgency();
        // ratio 37/30 = 1.2333 -> 46.67, minus 15
        assert!((urgency.score - (0.7 / 1.5 * 100.0 - 15.0)).abs() < 1e-6);
        assert_eq!(urgency.level, UrgencyLevel::Low);
    }

    #[test]
    fn levels_use_inclusive_lower_bounds() {
        assert_eq!(UrgencyLevel::from_score(80.0), UrgencyLevel::Critical);
        assert_eq!(UrgencyLevel::from_score(60.0), UrgencyLevel::High);
        assert_eq!(UrgencyLevel::from_score(40.0), UrgencyLevel::Medium);
        assert_eq!(UrgencyLevel::from_score(39.9), UrgencyLevel::Low);
    }
}
