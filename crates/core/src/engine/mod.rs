//! Engine facade: one entry point that normalizes raw inputs, runs the
//! configured strategy per ASIN and assembles the report.

pub mod strategy;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use strategy::{
    AnalysisStrategy, AsinAnalytics, AsinInput, BasicStrategy, ConfiguredStrategy,
    EnhancedStrategy, FallbackStrategy,
};

use crate::age::{
    rank_age_actions, AgeAction, AgeCategory, AgeEstimate, AgeSignals, InventoryAgeEstimator,
};
use crate::config::{EngineConfig, PurchaseConfig};
use crate::domain::{
    clean_purchase_ledger, DailyUnits, LedgerCleaning, RawPurchaseRow, RawStockRow, SalesRecord,
    StockFieldResolver, StockRecord,
};
use crate::errors::AnalyticsError;
use crate::priority::PriorityCategory;
use crate::purchases::{PurchaseAnalytics, PurchaseAnalyticsEngine};

/// Borrowed, already materialized inputs for one run.
#[derive(Clone, Copy, Debug)]
pub struct AnalyticsRequest<'a> {
    pub as_of: NaiveDate,
    pub orders: &'a [SalesRecord],
    pub stock: &'a [RawStockRow],
    pub purchases: &'a [RawPurchaseRow],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsinFailure {
    pub asin: String,
    pub error_class: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub asin: String,
    pub title: String,
    pub category: PriorityCategory,
    pub priority_score: f64,
    pub urgency: f64,
    pub current_stock: f64,
    pub weighted_velocity: f64,
    pub suggested_quantity: u64,
    pub reasoning: String,
}

impl Alert {
    fn from_analytics(analytics: &AsinAnalytics) -> Self {
        Self {
            asin: analytics.asin.clone(),
            title: analytics.title.clone(),
            category: analytics.priority.category,
            priority_score: analytics.priority.score,
            urgency: analytics.priority.urgency,
            current_stock: analytics.restock.current_stock,
            weighted_velocity: analytics.velocity.weighted_velocity,
            suggested_quantity: analytics.restock.suggested_quantity,
            reasoning: analytics.priority.reasoning.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub products_analyzed: usize,
    pub products_skipped: usize,
    pub products_failed: usize,
    pub by_priority: BTreeMap<PriorityCategory, usize>,
    pub total_suggested_units: u64,
    /// Suggested quantity times latest known COGS, for products with a cost.
    pub estimated_restock_cost: Decimal,
    pub by_age: BTreeMap<AgeCategory, usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub as_of: NaiveDate,
    pub strategy: String,
    pub products: BTreeMap<String, AsinAnalytics>,
    pub skipped_asins: Vec<String>,
    pub failures: Vec<AsinFailure>,
    pub critical_alerts: Vec<Alert>,
    pub restock_alerts: Vec<Alert>,
    pub age_actions: Vec<AgeAction>,
    pub age_estimates: BTreeMap<String, AgeEstimate>,
    pub purchases: PurchaseAnalytics,
    pub ledger: LedgerCleaning,
    pub summary: ReportSummary,
}

pub trait InventoryIntelligence {
    fn analyze(&self, request: &AnalyticsRequest<'_>) -> AnalyticsReport;
}

pub struct AnalyticsRuntime<S> {
    strategy: S,
    resolver: StockFieldResolver,
    utc_offset_minutes: i32,
    skip_zero_velocity: bool,
    purchases: PurchaseConfig,
}

impl<S> AnalyticsRuntime<S> {
    pub fn new(strategy: S, config: &EngineConfig) -> Self {
        Self {
            strategy,
            resolver: StockFieldResolver::default(),
            utc_offset_minutes: config.analysis.utc_offset_minutes,
            skip_zero_velocity: config.analysis.skip_zero_velocity,
            purchases: config.purchases.clone(),
        }
    }

    pub fn with_resolver(mut self, resolver: StockFieldResolver) -> Self {
        self.resolver = resolver;
        self
    }
}

impl AnalyticsRuntime<ConfiguredStrategy> {
    /// Validates the config and selects the strategy it names.
    pub fn from_config(config: &EngineConfig) -> Result<Self, AnalyticsError> {
        config.validate().map_err(|error| AnalyticsError::Configuration(error.to_string()))?;
        Ok(Self::new(ConfiguredStrategy::from_config(&config.analysis), config))
    }
}

impl Default for AnalyticsRuntime<ConfiguredStrategy> {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self::new(ConfiguredStrategy::from_config(&config.analysis), &config)
    }
}

impl<S> InventoryIntelligence for AnalyticsRuntime<S>
where
    S: AnalysisStrategy,
{
    fn analyze(&self, request: &AnalyticsRequest<'_>) -> AnalyticsReport {
        info!(
            event_name = "analytics.run.start",
            as_of = %request.as_of,
            strategy = self.strategy.name(),
            orders = request.orders.len(),
            stock_rows = request.stock.len(),
            purchase_rows = request.purchases.len(),
            "analytics run started"
        );

        let stock = self.resolver.resolve_sheet(request.stock);
        let daily = self.daily_units(request.orders);
        let (ledger_records, ledger) =
            clean_purchase_ledger(request.purchases, request.as_of, self.purchases.window_months);
        let purchases = PurchaseAnalyticsEngine::new(request.as_of).analyze(&ledger_records);

        let universe: BTreeSet<&str> =
            stock.keys().map(String::as_str).chain(daily.keys().map(String::as_str)).collect();
        let empty = DailyUnits::default();

        let mut products = BTreeMap::new();
        let mut skipped_asins = Vec::new();
        let mut failures = Vec::new();
        let mut velocities: BTreeMap<&str, f64> = BTreeMap::new();

        for asin in universe.iter().copied() {
            let record = stock.get(asin).cloned().unwrap_or_else(|| StockRecord::missing(asin));
            let input = AsinInput {
                asin,
                stock: &record,
                daily: daily.get(asin).unwrap_or(&empty),
                target: request.as_of,
            };

            match self.strategy.analyze_asin(&input) {
                Ok(mut analytics) => {
                    let weighted = analytics.velocity.weighted_velocity;
                    velocities.insert(asin, weighted);
                    if self.skip_zero_velocity && weighted == 0.0 {
                        skipped_asins.push(asin.to_string());
                        continue;
                    }
                    analytics.purchase = purchases.insights.get(asin).cloned();
                    products.insert(asin.to_string(), analytics);
                }
                Err(error) => {
                    let error = AnalyticsError::from(error);
                    warn!(
                        event_name = "analytics.asin.failed",
                        asin,
                        error_class = error.error_class(),
                        error = %error,
                        "asin analysis failed"
                    );
                    failures.push(AsinFailure {
                        asin: asin.to_string(),
                        error_class: error.error_class().to_string(),
                        message: error.to_string(),
                    });
                }
            }
        }

        let estimator = InventoryAgeEstimator::new(request.as_of);
        let mut age_estimates = BTreeMap::new();
        let mut age_actions = Vec::new();
        for (asin, record) in &stock {
            let velocity = velocities.get(asin.as_str()).copied().unwrap_or(0.0);
            let insight = purchases.insights.get(asin);
            let signals = AgeSignals {
                last_purchase_date: insight.map(|insight| insight.last_purchase_date),
                days_since_last_purchase: None,
                created_date: record.created_date,
                first_sale_date: daily.get(asin).and_then(DailyUnits::first_sale_date),
                current_stock: record.current_stock,
                daily_velocity: velocity,
            };
            let estimate = estimator.estimate(&signals);
            if let Some(action) = AgeAction::from_estimate(
                asin,
                &record.title,
                &estimate,
                record.current_stock,
                velocity,
            ) {
                age_actions.push(action);
            }
            if let Some(analytics) = products.get_mut(asin) {
                analytics.age = Some(estimate.clone());
            }
            age_estimates.insert(asin.clone(), estimate);
        }
        rank_age_actions(&mut age_actions);

        let mut critical_alerts: Vec<Alert> = products
            .values()
            .filter(|analytics| analytics.priority.category.is_critical())
            .map(Alert::from_analytics)
            .collect();
        let mut restock_alerts: Vec<Alert> = products
            .values()
            .filter(|analytics| {
                analytics.priority.category.is_actionable()
                    && analytics.restock.suggested_quantity > 0
            })
            .map(Alert::from_analytics)
            .collect();
        rank_alerts(&mut critical_alerts);
        rank_alerts(&mut restock_alerts);

        let summary = summarize(&products, &age_estimates, skipped_asins.len(), failures.len());

        info!(
            event_name = "analytics.run.complete",
            products = summary.products_analyzed,
            skipped = summary.products_skipped,
            failed = summary.products_failed,
            critical_alerts = critical_alerts.len(),
            restock_alerts = restock_alerts.len(),
            age_actions = age_actions.len(),
            "analytics run completed"
        );

        AnalyticsReport {
            as_of: request.as_of,
            strategy: self.strategy.name().to_string(),
            products,
            skipped_asins,
            failures,
            critical_alerts,
            restock_alerts,
            age_actions,
            age_estimates,
            purchases,
            ledger,
            summary,
        }
    }
}

impl<S> AnalyticsRuntime<S> {
    fn daily_units(&self, orders: &[SalesRecord]) -> BTreeMap<String, DailyUnits> {
        let mut by_asin: BTreeMap<&str, Vec<&SalesRecord>> = BTreeMap::new();
        for order in orders.iter().filter(|order| order.status.counts_as_sale()) {
            by_asin.entry(order.asin.as_str()).or_default().push(order);
        }
        by_asin
            .into_iter()
            .map(|(asin, records)| {
                let daily = DailyUnits::from_records(records, self.utc_offset_minutes);
                (asin.to_string(), daily)
            })
            .filter(|(_, daily)| !daily.is_empty())
            .collect()
    }
}

/// Highest priority score first; ties by ASIN.
fn rank_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.asin.cmp(&b.asin))
    });
}

fn summarize(
    products: &BTreeMap<String, AsinAnalytics>,
    age_estimates: &BTreeMap<String, AgeEstimate>,
    skipped: usize,
    failed: usize,
) -> ReportSummary {
    let mut summary = ReportSummary {
        products_analyzed: products.len(),
        products_skipped: skipped,
        products_failed: failed,
        ..ReportSummary::default()
    };

    for analytics in products.values() {
        *summary.by_priority.entry(analytics.priority.category).or_insert(0) += 1;
        let quantity = analytics.restock.suggested_quantity;
        summary.total_suggested_units += quantity;
        let cogs = analytics.purchase.as_ref().and_then(|insight| insight.latest_cogs);
        if let Some(cogs) = cogs {
            let cost = cogs
                .checked_mul(Decimal::from(quantity))
                .and_then(|cost| summary.estimated_restock_cost.checked_add(cost));
            match cost {
                Some(cost) => summary.estimated_restock_cost = cost,
                None => warn!(
                    event_name = "analytics.restock_cost.overflow",
                    asin = %analytics.asin,
                    "restock cost is out of range; left out of the estimate"
                ),
            }
        }
    }
    for estimate in age_estimates.values() {
        *summary.by_age.entry(estimate.category).or_insert(0) += 1;
    }

    summary
}
