use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::PurchaseRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoiRecommendation {
    HighPriority,
    MediumPriority,
    LowPriority,
    ReviewRequired,
}

impl RoiRecommendation {
    /// Unknown ROI always needs a human look.
    pub fn from_roi(roi_percentage: Option<f64>) -> Self {
        match roi_percentage {
            Some(roi) if roi >= 50.0 => Self::HighPriority,
            Some(roi) if roi >= 25.0 => Self::MediumPriority,
            Some(roi) if roi >= 10.0 => Self::LowPriority,
            _ => Self::ReviewRequired,
        }
    }
}

/// ROI of a single ledger entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiEntry {
    pub date: NaiveDate,
    pub cogs: Decimal,
    pub sale_price: Decimal,
    pub roi_percentage: f64,
}

/// `(sale - cogs) / cogs * 100`; `None` when cogs is not positive.
pub fn roi_percentage(sale_price: Decimal, cogs: Decimal) -> Option<f64> {
    if cogs <= Decimal::ZERO {
        return None;
    }
    let ratio = (sale_price - cogs).checked_div(cogs)?;
    ratio.checked_mul(Decimal::ONE_HUNDRED)?.to_f64().filter(|roi| roi.is_finite())
}

pub fn average(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    let mut sum = Decimal::ZERO;
    let mut count = 0u32;
    for value in values {
        sum = sum.checked_add(value)?;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    sum.checked_div(Decimal::from(count))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiSummary {
    pub avg_cogs: Option<Decimal>,
    pub avg_sale_price: Option<Decimal>,
    pub roi_percentage: Option<f64>,
    pub recommendation: RoiRecommendation,
    pub history: Vec<RoiEntry>,
}

impl RoiSummary {
    /// The sale price is carried forward: an entry without one is valued at the
    /// most recent known sale price, or the first later one for leading entries.
    pub fn from_purchases(purchases: &[&PurchaseRecord]) -> Self {
        let avg_cogs = average(purchases.iter().filter_map(|purchase| purchase.cogs));
        let avg_sale_price = average(purchases.iter().filter_map(|purchase| purchase.sale_price));
        let aggregate_roi = match (avg_sale_price, avg_cogs) {
            (Some(sale), Some(cogs)) => roi_percentage(sale, cogs),
            _ => None,
        };

        let first_known_price = purchases.iter().find_map(|purchase| purchase.sale_price);
        let mut carried_price = first_known_price;
        let mut history = Vec::new();
        for purchase in purchases {
            if purchase.sale_price.is_some() {
                carried_price = purchase.sale_price;
            }
            let (Some(cogs), Some(sale_price)) = (purchase.cogs, carried_price) else {
                continue;
            };
            if let Some(roi) = roi_percentage(sale_price, cogs) {
                history.push(RoiEntry {
                    date: purchase.date,
                    cogs,
                    sale_price,
                    roi_percentage: roi,
                });
            }
        }

        Self {
            avg_cogs,
            avg_sale_price,
            roi_percentage: aggregate_roi,
            recommendation: RoiRecommendation::from_roi(aggregate_roi),
            history,
        }
    }
}
