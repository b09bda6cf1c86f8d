//! Purchase-ledger analytics: reorder cadence and urgency, ROI, seasonal
//! buying pattern and portfolio cash flow.

mod cadence;
mod cash_flow;
mod roi;
mod seasonal;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use cadence::{purchase_trend, time_urgency, CadenceMetrics, PurchaseUrgency, UrgencyLevel};
pub use cash_flow::{CashFlowFlag, CashFlowSummary};
pub use roi::{roi_percentage, RoiEntry, RoiRecommendation, RoiSummary};
pub use seasonal::SeasonalTrend;

use crate::domain::PurchaseRecord;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseInsight {
    pub asin: String,
    pub total_purchases: usize,
    pub total_quantity: f64,
    pub avg_quantity_per_purchase: f64,
    pub avg_days_between_purchases: Option<f64>,
    pub days_since_last_purchase: i64,
    pub last_purchase_date: NaiveDate,
    pub purchase_trend: f64,
    pub urgency_score: f64,
    pub urgency_level: UrgencyLevel,
    pub urgency_reason: String,
    pub avg_cogs: Option<Decimal>,
    pub avg_sale_price: Option<Decimal>,
    pub latest_cogs: Option<Decimal>,
    pub latest_sale_price: Option<Decimal>,
    pub roi_percentage: Option<f64>,
    pub recommendation: RoiRecommendation,
    pub roi_history: Vec<RoiEntry>,
    pub seasonal: SeasonalTrend,
    pub units_per_bundle: u32,
    pub source_link: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseAnalytics {
    pub insights: BTreeMap<String, PurchaseInsight>,
    pub cash_flow: CashFlowSummary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurchaseAnalyticsEngine {
    as_of: NaiveDate,
}

impl PurchaseAnalyticsEngine {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    /// Expects a cleaned ledger; see [`crate::domain::clean_purchase_ledger`].
    pub fn analyze(&self, purchases: &[PurchaseRecord]) -> PurchaseAnalytics {
        let mut by_asin: BTreeMap<&str, Vec<&PurchaseRecord>> = BTreeMap::new();
        for purchase in purchases {
            by_asin.entry(purchase.asin.as_str()).or_default().push(purchase);
        }

        let insights = by_asin
            .into_iter()
            .filter_map(|(asin, mut history)| {
                history.sort_by_key(|purchase| purchase.date);
                self.insight(asin, &history).map(|insight| (asin.to_string(), insight))
            })
            .collect();

        PurchaseAnalytics { insights, cash_flow: CashFlowSummary::from_purchases(purchases) }
    }

    pub fn insight(&self, asin: &str, history: &[&PurchaseRecord]) -> Option<PurchaseInsight> {
        let cadence = CadenceMetrics::from_purchases(history, self.as_of)?;
        let urgency = cadence.urgency();
        let roi = RoiSummary::from_purchases(history);
        let latest = history.last()?;

        Some(PurchaseInsight {
            asin: asin.to_string(),
            total_purchases: cadence.total_purchases,
            total_quantity: cadence.total_quantity,
            avg_quantity_per_purchase: cadence.avg_quantity_per_purchase,
            avg_days_between_purchases: cadence.avg_days_between_purchases,
            days_since_last_purchase: cadence.days_since_last_purchase,
            last_purchase_date: cadence.last_purchase_date,
            purchase_trend: cadence.purchase_trend,
            urgency_score: urgency.score,
            urgency_level: urgency.level,
            urgency_reason: urgency.reason,
            avg_cogs: roi.avg_cogs,
            avg_sale_price: roi.avg_sale_price,
            latest_cogs: history.iter().rev().find_map(|purchase| purchase.cogs),
            latest_sale_price: history.iter().rev().find_map(|purchase| purchase.sale_price),
            roi_percentage: roi.roi_percentage,
            recommendation: roi.recommendation,
            roi_history: roi.history,
            seasonal: SeasonalTrend::from_purchases(history),
            units_per_bundle: latest.units_per_bundle,
            source_link: history.iter().rev().find_map(|purchase| purchase.source_link.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn purchase(day: &str, asin: &str, quantity: f64, cogs: i64) -> PurchaseRecord {
        PurchaseRecord {
            date: date(day),
            asin: asin.to_string(),
            quantity_purchased: quantity,
            cogs: Some(Decimal::from(cogs)),
            sale_price: Some(Decimal::from(12)),
            units_per_bundle: 1,
            source_link: None,
        }
    }

    #[test]
    fn two_purchase_ledger_is_high_priority() {
        let ledger =
            vec![purchase("2024-01-01", "X", 10.0, 5), purchase("2024-02-01", "X", 10.0, 6)];
        let analytics = PurchaseAnalyticsEngine::new(date("2024-03-01")).analyze(&ledger);
        let insight = &analytics.insights["X"];

        let february = insight
            .roi_history
            .iter()
            .find(|entry| entry.date == date("2024-02-01"))
            .expect("february entry");
        assert!((february.roi_percentage - 100.0).abs() < 1e-9);
        assert_eq!(insight.recommendation, RoiRecommendation::HighPriority);
        assert_eq!(insight.avg_days_between_purchases, Some(31.0));
        assert_eq!(insight.latest_cogs, Some(Decimal::from(6)));
        assert_eq!(insight.total_quantity, 20.0);
    }

    #[test]
    fn insights_are_grouped_per_asin() {
        let ledger = vec![
            purchase("2024-02-01", "B", 5.0, 2),
            purchase("2024-01-01", "A", 10.0, 5),
            purchase("2024-01-15", "B", 5.0, 2),
        ];
        let analytics = PurchaseAnalyticsEngine::new(date("2024-03-01")).analyze(&ledger);

        let asins: Vec<&str> = analytics.insights.keys().map(String::as_str).collect();
        assert_eq!(asins, vec!["A", "B"]);
        assert_eq!(analytics.insights["B"].last_purchase_date, date("2024-02-01"));
        assert_eq!(analytics.insights["B"].total_purchases, 2);
        assert_eq!(analytics.cash_flow.total_investment, Some(Decimal::from(70)));
    }

    #[test]
    fn latest_link_and_bundle_come_from_most_recent_entry() {
        let mut older = purchase("2024-01-01", "A", 10.0, 5);
        older.source_link = Some("https://supplier.example/a".to_string());
        older.units_per_bundle = 4;
        let newer = purchase("2024-02-01", "A", 10.0, 5);

        let analytics = PurchaseAnalyticsEngine::new(date("2024-03-01")).analyze(&[older, newer]);
        let insight = &analytics.insights["A"];

        assert_eq!(insight.source_link.as_deref(), Some("https://supplier.example/a"));
        assert_eq!(insight.units_per_bundle, 1);
    }

    #[test]
    fn out_of_range_investment_is_unknown_instead_of_fatal() {
        let ledger = vec![
            purchase("2024-01-01", "HUGE", 1e20, 1_000_000_000),
            purchase("2024-01-10", "A", 10.0, 5),
        ];
        let analytics = PurchaseAnalyticsEngine::new(date("2024-03-01")).analyze(&ledger);

        assert_eq!(ledger[0].investment(), None);
        assert_eq!(analytics.insights["HUGE"].total_purchases, 1);
        assert_eq!(analytics.cash_flow.total_investment, Some(Decimal::from(50)));
    }

    #[test]
    fn empty_ledger_yields_empty_analytics() {
        let analytics = PurchaseAnalyticsEngine::new(date("2024-03-01")).analyze(&[]);
        assert!(analytics.insights.is_empty());
        assert_eq!(analytics.cash_flow.total_investment, Some(Decimal::ZERO));
    }
}
