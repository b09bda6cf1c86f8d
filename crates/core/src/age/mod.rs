//! Inventory age estimation.
//!
//! No single input records when the units on the shelf arrived, so the
//! estimator fuses up to four independent signals, each carrying its own
//! confidence:
//!
//! 1. purchase-ledger recency (or the coarser days-since figure from the
//!    purchase analytics when the exact date is unknown),
//! 2. a created/received date on the stock sheet,
//! 3. the first sale in the order history plus an acquisition buffer,
//! 4. a stock-level heuristic for products holding more than half a year
//!    of cover.
//!
//! The fused age is the confidence-weighted mean of whichever signals are
//! present.

mod actions;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use actions::{action_score, rank_age_actions, AgeAction};

/// Days added to the first observed sale: stock arrives before it sells.
pub const ACQUISITION_BUFFER_DAYS: i64 = 7;
/// Cover beyond which the stock-level heuristic kicks in.
pub const SLOW_COVER_DAYS: f64 = 180.0;
pub const MAX_HEURISTIC_AGE_DAYS: f64 = 365.0;
pub const LOW_CONFIDENCE: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeCategory {
    Fresh,
    Moderate,
    Aged,
    Old,
    Ancient,
    Unknown,
}

impl AgeCategory {
    pub fn from_days(days: u32) -> Self {
        match days {
            0..=30 => Self::Fresh,
            31..=90 => Self::Moderate,
            91..=180 => Self::Aged,
            181..=365 => Self::Old,
            _ => Self::Ancient,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Moderate => "moderate",
            Self::Aged => "aged",
            Self::Old => "old",
            Self::Ancient => "ancient",
            Self::Unknown => "unknown",
        }
    }

    /// Categories that belong on the action list.
    pub fn needs_action(&self) -> bool {
        matches!(self, Self::Aged | Self::Old | Self::Ancient)
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeSourceKind {
    PurchaseLedger,
    PurchaseCadence,
    StockSheetDate,
    FirstSale,
    StockLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgeSource {
    pub name: AgeSourceKind,
    pub age_days: f64,
    pub weight: f64,
    pub confidence: f64,
}

/// Raw evidence about one product's age.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgeSignals {
    pub last_purchase_date: Option<NaiveDate>,
    /// Used only when `last_purchase_date` is absent. The analytics engine
    /// always has the exact date from the ledger, so this serves callers that
    /// only track a days-since figure.
    pub days_since_last_purchase: Option<i64>,
    pub created_date: Option<NaiveDate>,
    pub first_sale_date: Option<NaiveDate>,
    pub current_stock: f64,
    pub daily_velocity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgeEstimate {
    pub estimated_age_days: Option<u32>,
    pub category: AgeCategory,
    pub confidence: f64,
    pub sources: Vec<AgeSource>,
    pub recommendations: Vec<String>,
}

impl AgeEstimate {
    pub fn unknown() -> Self {
        Self {
            estimated_age_days: None,
            category: AgeCategory::Unknown,
            confidence: 0.0,
            sources: Vec::new(),
            recommendations: recommendations(AgeCategory::Unknown, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InventoryAgeEstimator {
    as_of: NaiveDate,
}

impl InventoryAgeEstimator {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    pub fn sources(&self, signals: &AgeSignals) -> Vec<AgeSource> {
        let mut sources = Vec::with_capacity(4);

        if let Some(date) = signals.last_purchase_date {
            sources.push(source(AgeSourceKind::PurchaseLedger, self.days_since(date), 0.4, 0.9));
        } else if let Some(days) = signals.days_since_last_purchase {
            sources.push(source(AgeSourceKind::PurchaseCadence, days as f64, 0.3, 0.8));
        }

        if let Some(date) = signals.created_date {
            sources.push(source(AgeSourceKind::StockSheetDate, self.days_since(date), 0.3, 0.7));
        }

        if let Some(date) = signals.first_sale_date {
            let age = self.days_since(date) + ACQUISITION_BUFFER_DAYS as f64;
            sources.push(source(AgeSourceKind::FirstSale, age, 0.2, 0.5));
        }

        if signals.daily_velocity > 0.0 && signals.current_stock > 0.0 {
            let days_of_stock = signals.current_stock / signals.daily_velocity;
            if days_of_stock.is_finite() && days_of_stock > SLOW_COVER_DAYS {
                let age = (days_of_stock * 0.5).min(MAX_HEURISTIC_AGE_DAYS);
                sources.push(source(AgeSourceKind::StockLevel, age, 0.1, 0.3));
            }
        }

        sources
    }

    pub fn estimate(&self, signals: &AgeSignals) -> AgeEstimate {
        let sources = self.sources(signals);
        let total_confidence: f64 = sources.iter().map(|source| source.confidence).sum();
        if sources.is_empty() || total_confidence <= 0.0 {
            return AgeEstimate::unknown();
        }

        let weighted_sum: f64 =
            sources.iter().map(|source| source.age_days * source.confidence).sum();
        let weighted_age = weighted_sum / total_confidence;
        let age_days = weighted_age.max(0.0).round() as u32;
        let category = AgeCategory::from_days(age_days);
        let confidence = total_confidence.min(1.0);

        AgeEstimate {
            estimated_age_days: Some(age_days),
            category,
            confidence,
            sources,
            recommendations: recommendations(category, confidence),
        }
    }

    fn days_since(&self, date: NaiveDate) -> f64 {
        (self.as_of - date).num_days().max(0) as f64
    }
}

fn source(name: AgeSourceKind, age_days: f64, weight: f64, confidence: f64) -> AgeSource {
    AgeSource { name, age_days: age_days.max(0.0), weight, confidence }
}

pub fn recommendations(category: AgeCategory, confidence: f64) -> Vec<String> {
    let mut lines: Vec<String> = match category {
        AgeCategory::Fresh => vec!["Inventory is fresh, no action needed".to_string()],
        AgeCategory::Moderate => {
            vec!["Watch sell-through and hold the next reorder if velocity slows".to_string()]
        }
        AgeCategory::Aged => vec![
            "Run a promotion or coupon to speed up sell-through".to_string(),
            "Trim the next reorder quantity".to_string(),
        ],
        AgeCategory::Old => vec![
            "Price for clearance before long-term storage fees apply".to_string(),
            "Pause reorders until stock clears".to_string(),
        ],
        AgeCategory::Ancient => vec![
            "Liquidate or request removal of remaining units".to_string(),
            "Do not reorder".to_string(),
        ],
        AgeCategory::Unknown => {
            vec!["Record purchase or received dates to enable age tracking".to_string()]
        }
    };
    if category != AgeCategory::Unknown && confidence < LOW_CONFIDENCE {
        lines.push(format!(
            "Low confidence estimate ({confidence:.2}); verify against receiving records"
        ));
    }
    lines
}
