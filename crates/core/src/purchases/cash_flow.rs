use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::PurchaseRecord;
use crate::stats;

const TRAILING_MONTHS: usize = 3;
const HIGH_VOLATILITY_CV: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowFlag {
    OverBudget,
    UnderInvested,
    HighVolatility,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    /// `YYYY-MM` to total `cogs * quantity` spent that month.
    pub monthly_investment: BTreeMap<String, Decimal>,
    /// `None` when the sum does not fit in a `Decimal`.
    pub total_investment: Option<Decimal>,
    pub average_monthly: Option<Decimal>,
    pub trailing_average: Option<Decimal>,
    pub coefficient_of_variation: Option<f64>,
    pub flags: Vec<CashFlowFlag>,
}

impl CashFlowSummary {
    /// Rows without a cost are not counted as investment.
    pub fn from_purchases<'a>(purchases: impl IntoIterator<Item = &'a PurchaseRecord>) -> Self {
        let mut monthly_investment: BTreeMap<String, Decimal> = BTreeMap::new();
        for purchase in purchases {
            let Some(investment) = purchase.investment() else {
                continue;
            };
            let key = format!("{:04}-{:02}", purchase.date.year(), purchase.date.month());
            let month = monthly_investment.entry(key).or_insert(Decimal::ZERO);
            match month.checked_add(investment) {
                Some(sum) => *month = sum,
                None => warn!(
                    event_name = "purchases.investment.overflow",
                    asin = %purchase.asin,
                    date = %purchase.date,
                    "monthly investment is out of range; row skipped"
                ),
            }
        }

        let values: Vec<Decimal> = monthly_investment.values().copied().collect();
        let total_investment = values
            .iter()
            .try_fold(Decimal::ZERO, |total, value| total.checked_add(*value));
        let average_monthly = super::roi::average(values.iter().copied());
        let trailing = &values[values.len().saturating_sub(TRAILING_MONTHS)..];
        let trailing_average = super::roi::average(trailing.iter().copied());

        let as_f64: Vec<f64> = values.iter().filter_map(ToPrimitive::to_f64).collect();
        let coefficient_of_variation =
            stats::coefficient_of_variation(&as_f64).and_then(stats::finite);

        let mut flags = Vec::new();
        if let (Some(average), Some(trailing)) = (average_monthly, trailing_average) {
            let upper = average.checked_mul(Decimal::new(12, 1));
            let lower = average.checked_mul(Decimal::new(8, 1));
            if upper.is_some_and(|upper| trailing > upper) {
                flags.push(CashFlowFlag::OverBudget);
            } else if lower.is_some_and(|lower| trailing < lower) {
                flags.push(CashFlowFlag::UnderInvested);
            }
        }
        if coefficient_of_variation.is_some_and(|cv| cv > HIGH_VOLATILITY_CV) {
            flags.push(CashFlowFlag::HighVolatility);
        }

        Self {
            monthly_investment,
            total_investment,
            average_monthly,
            trailing_average,
            coefficient_of_variation,
            flags,
        }
    }
}
