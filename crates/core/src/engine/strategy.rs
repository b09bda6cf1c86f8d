use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::age::AgeEstimate;
use crate::config::{AnalysisConfig, StrategyKind};
use crate::domain::{DailyUnits, StockRecord};
use crate::errors::{ensure_finite, DomainError};
use crate::priority::{self, PriorityResult, PriorityScorer};
use crate::purchases::PurchaseInsight;
use crate::restock::{RestockPlan, RestockQuantityOptimizer};
use crate::velocity::{TrendDirection, VelocityCalculator, VelocityResult, DEFAULT_CONFIDENCE};

/// Everything a strategy may read for one ASIN.
#[derive(Clone, Copy, Debug)]
pub struct AsinInput<'a> {
    pub asin: &'a str,
    pub stock: &'a StockRecord,
    pub daily: &'a DailyUnits,
    pub target: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsinAnalytics {
    pub asin: String,
    pub title: String,
    pub strategy: String,
    pub velocity: VelocityResult,
    pub priority: PriorityResult,
    pub restock: RestockPlan,
    pub purchase: Option<PurchaseInsight>,
    pub age: Option<AgeEstimate>,
}

pub trait AnalysisStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze_asin(&self, input: &AsinInput<'_>) -> Result<AsinAnalytics, DomainError>;
}

fn validate_stock(input: &AsinInput<'_>) -> Result<(), DomainError> {
    ensure_finite(input.asin, "current_stock", input.stock.current_stock)?;
    ensure_finite(input.asin, "days_left", input.stock.days_left)?;
    if input.stock.current_stock < 0.0 {
        return Err(DomainError::NegativeInput {
            asin: input.asin.to_string(),
            field: "current_stock",
        });
    }
    Ok(())
}

fn check_outputs(
    asin: &str,
    priority: &PriorityResult,
    restock: &RestockPlan,
) -> Result<(), DomainError> {
    let values = [
        ("priority_score", priority.score),
        ("opportunity", priority.opportunity),
        ("adjusted_velocity", restock.adjusted_velocity),
        ("estimated_coverage_days", restock.estimated_coverage_days),
    ];
    for (field, value) in values {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::InvariantViolation(format!(
                "{asin}: `{field}` evaluated to {value}"
            )));
        }
    }
    Ok(())
}

/// Multi-period velocity, trend, seasonality and confidence-driven safety stock.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnhancedStrategy {
    velocity: VelocityCalculator,
    priority: PriorityScorer,
    restock: RestockQuantityOptimizer,
}

impl EnhancedStrategy {
    pub fn new(
        velocity: VelocityCalculator,
        priority: PriorityScorer,
        restock: RestockQuantityOptimizer,
    ) -> Self {
        Self { velocity, priority, restock }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            VelocityCalculator::new(config.include_target_day),
            PriorityScorer::default(),
            RestockQuantityOptimizer::new(config.lead_time_days),
        )
    }
}

impl AnalysisStrategy for EnhancedStrategy {
    fn name(&self) -> &'static str {
        "enhanced"
    }

    fn analyze_asin(&self, input: &AsinInput<'_>) -> Result<AsinAnalytics, DomainError> {
        validate_stock(input)?;

        let velocity = self.velocity.calculate(input.daily, input.target);
        let priority = self.priority.score(&velocity, input.stock, input.target);
        let restock = self.restock.plan(&velocity, input.stock.current_stock, input.target);
        check_outputs(input.asin, &priority, &restock)?;

        Ok(AsinAnalytics {
            asin: input.asin.to_string(),
            title: input.stock.title.clone(),
            strategy: self.name().to_string(),
            velocity,
            priority,
            restock,
            purchase: None,
            age: None,
        })
    }
}

pub const BASIC_PERIOD_DAYS: u32 = 30;

/// Degraded analysis: 30-day velocity, no trend, no seasonality, urgency
/// from the sheet's days-left figure alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicStrategy {
    include_target_day: bool,
    restock: RestockQuantityOptimizer,
}

impl BasicStrategy {
    pub fn new(include_target_day: bool, restock: RestockQuantityOptimizer) -> Self {
        Self { include_target_day, restock }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.include_target_day, RestockQuantityOptimizer::new(config.lead_time_days))
    }

    fn velocity(&self, daily: &DailyUnits, target: NaiveDate) -> VelocityResult {
        let end = if self.include_target_day { target } else { target - Duration::days(1) };
        let start = end - Duration::days(i64::from(BASIC_PERIOD_DAYS) - 1);
        let v30 = daily.units_between(start, end) as f64 / f64::from(BASIC_PERIOD_DAYS);
        let target_day_units = daily.units_on(target);
        let same_day_fallback = v30 == 0.0 && target_day_units > 0;

        VelocityResult {
            period_velocities: BTreeMap::from([(BASIC_PERIOD_DAYS, v30)]),
            weighted_velocity: if same_day_fallback { target_day_units as f64 } else { v30 },
            trend_factor: 1.0,
            trend_direction: TrendDirection::Stable,
            confidence: DEFAULT_CONFIDENCE,
            target_day_units,
            same_day_fallback,
        }
    }
}

impl AnalysisStrategy for BasicStrategy {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn analyze_asin(&self, input: &AsinInput<'_>) -> Result<AsinAnalytics, DomainError> {
        validate_stock(input)?;

        let velocity = self.velocity(input.daily, input.target);
        let weighted = velocity.weighted_velocity;
        let urgency = priority::days_left_urgency(input.stock.days_left);
        let opportunity = weighted;
        let current_stock = input.stock.current_stock;
        let category = priority::categorize(urgency, opportunity, weighted, current_stock);
        let reasoning = format!(
            "Basic analysis | {:.0} units on hand, {:.0} days left | Selling {:.2} units/day",
            input.stock.current_stock, input.stock.days_left, weighted
        );
        let priority = PriorityResult {
            score: urgency * (1.0 + opportunity),
            category,
            urgency,
            opportunity,
            reasoning,
        };
        let restock = self.restock.plan_for_velocity(
            weighted,
            velocity.confidence,
            input.stock.current_stock,
        );
        check_outputs(input.asin, &priority, &restock)?;

        Ok(AsinAnalytics {
            asin: input.asin.to_string(),
            title: input.stock.title.clone(),
            strategy: self.name().to_string(),
            velocity,
            priority,
            restock,
            purchase: None,
            age: None,
        })
    }
}

/// Runs `primary`; when it fails, logs the failure and runs `fallback`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackStrategy<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackStrategy<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> AnalysisStrategy for FallbackStrategy<P, F>
where
    P: AnalysisStrategy,
    F: AnalysisStrategy,
{
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn analyze_asin(&self, input: &AsinInput<'_>) -> Result<AsinAnalytics, DomainError> {
        match self.primary.analyze_asin(input) {
            Ok(analytics) => Ok(analytics),
            Err(error) => {
                warn!(
                    event_name = "analytics.asin.fallback",
                    asin = input.asin,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %error,
                    "primary analysis failed, using fallback"
                );
                self.fallback.analyze_asin(input)
            }
        }
    }
}

/// The strategy selected by `analysis.strategy`.
#[derive(Clone, Copy, Debug)]
pub enum ConfiguredStrategy {
    Enhanced(FallbackStrategy<EnhancedStrategy, BasicStrategy>),
    Basic(BasicStrategy),
}

impl ConfiguredStrategy {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        match config.strategy {
            StrategyKind::Enhanced => Self::Enhanced(FallbackStrategy::new(
                EnhancedStrategy::from_config(config),
                BasicStrategy::from_config(config),
            )),
            StrategyKind::Basic => Self::Basic(BasicStrategy::from_config(config)),
        }
    }
}

impl AnalysisStrategy for ConfiguredStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Enhanced(strategy) => strategy.name(),
            Self::Basic(strategy) => strategy.name(),
        }
    }

    fn analyze_asin(&self, input: &AsinInput<'_>) -> Result<AsinAnalytics, DomainError> {
        match self {
            Self::Enhanced(strategy) => strategy.analyze_asin(input),
            Self::Basic(strategy) => strategy.analyze_asin(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::domain::{OrderStatus, SalesRecord};

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
    }

    fn daily(days_back: &[(i64, u32)]) -> DailyUnits {
        let records: Vec<SalesRecord> = days_back
            .iter()
            .map(|(offset, quantity)| SalesRecord {
                purchased_at: Utc.from_utc_datetime(
                    &(target() - Duration::days(*offset)).and_hms_opt(10, 0, 0).unwrap(),
                ),
                asin: "B0STRAT".to_string(),
                quantity: *quantity,
                status: OrderStatus::Shipped,
            })
            .collect();
        DailyUnits::from_records(&records, 0)
    }

    fn stock(current_stock: f64, days_left: f64) -> StockRecord {
        StockRecord {
            title: "Widget".to_string(),
            current_stock,
            days_left,
            ..StockRecord::missing("B0STRAT")
        }
    }

    struct Failing;

    impl AnalysisStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn analyze_asin(&self, input: &AsinInput<'_>) -> Result<AsinAnalytics, DomainError> {
            Err(DomainError::InvariantViolation(format!("{} always fails", input.asin)))
        }
    }

    #[test]
    fn out_of_stock_fast_seller_is_critical() {
        let daily = daily(&(1..=30).map(|offset| (offset, 5)).collect::<Vec<_>>());
        let stock = stock(0.0, 9999.0);
        let input = AsinInput { asin: "B0STRAT", stock: &stock, daily: &daily, target: target() };

        let analytics = EnhancedStrategy::default().analyze_asin(&input).unwrap();

        assert_eq!(analytics.priority.urgency, 1.0);
        assert!(analytics.priority.category.is_critical());
        assert!(analytics.restock.suggested_quantity > 0);
        assert_eq!(analytics.strategy, "enhanced");
        assert_eq!(analytics.title, "Widget");
    }

    #[test]
    fn basic_strategy_ignores_trend_and_season() {
        let daily = daily(&[(1, 30), (2, 30)]);
        let stock = stock(100.0, 20.0);
        let input = AsinInput { asin: "B0STRAT", stock: &stock, daily: &daily, target: target() };

        let analytics = BasicStrategy::default().analyze_asin(&input).unwrap();

        assert!((analytics.velocity.weighted_velocity - 2.0).abs() < 1e-12);
        assert_eq!(analytics.velocity.trend_factor, 1.0);
        assert_eq!(analytics.velocity.confidence, 0.5);
        assert_eq!(analytics.priority.urgency, 0.3);
        assert_eq!(analytics.restock.safety_days, 21);
        assert_eq!(analytics.strategy, "basic");
    }

    #[test]
    fn non_finite_stock_is_rejected() {
        let daily = daily(&[]);
        let stock = stock(f64::INFINITY, 10.0);
        let input = AsinInput { asin: "B0STRAT", stock: &stock, daily: &daily, target: target() };

        let error = EnhancedStrategy::default().analyze_asin(&input).unwrap_err();
        assert_eq!(
            error,
            DomainError::NonFiniteInput { asin: "B0STRAT".to_string(), field: "current_stock" }
        );
    }

    #[test]
    fn fallback_runs_secondary_strategy_on_failure() {
        let daily = daily(&[(1, 3)]);
        let stock = stock(10.0, 5.0);
        let input = AsinInput { asin: "B0STRAT", stock: &stock, daily: &daily, target: target() };

        let strategy = FallbackStrategy::new(Failing, BasicStrategy::default());
        let analytics = strategy.analyze_asin(&input).unwrap();

        assert_eq!(analytics.strategy, "basic");
        assert_eq!(strategy.name(), "failing");
    }

    #[test]
    fn configured_strategy_follows_config() {
        let mut config = crate::config::EngineConfig::default().analysis;
        assert_eq!(ConfiguredStrategy::from_config(&config).name(), "enhanced");

        config.strategy = StrategyKind::Basic;
        assert_eq!(ConfiguredStrategy::from_config(&config).name(), "basic");
    }
}
