use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::domain::PurchaseRecord;

/// Purchase quantity per calendar month, pooled across years.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTrend {
    pub monthly_quantity: BTreeMap<u32, f64>,
    pub peak_month: Option<u32>,
    pub low_month: Option<u32>,
}

impl SeasonalTrend {
    pub fn from_purchases(purchases: &[&PurchaseRecord]) -> Self {
        let mut monthly_quantity = BTreeMap::new();
        for purchase in purchases {
            *monthly_quantity.entry(purchase.date.month()).or_insert(0.0) +=
                purchase.quantity_purchased;
        }

        // Months iterate in ascending order and only strict improvements
        // replace the leader, so ties resolve to the earliest month.
        let mut peak: Option<(u32, f64)> = None;
        let mut low: Option<(u32, f64)> = None;
        for (month, quantity) in &monthly_quantity {
            if peak.map_or(true, |(_, best)| *quantity > best) {
                peak = Some((*month, *quantity));
            }
            if low.map_or(true, |(_, best)| *quantity < best) {
                low = Some((*month, *quantity));
            }
        }

        Self {
            monthly_quantity,
            peak_month: peak.map(|(month, _)| month),
            low_month: low.map(|(month, _)| month),
        }
    }
}
