pub mod age;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod priority;
pub mod purchases;
pub mod restock;
pub mod seasonality;
pub mod stats;
pub mod velocity;

pub use age::{AgeAction, AgeCategory, AgeEstimate, AgeSignals, AgeSource, InventoryAgeEstimator};
pub use config::{ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat, StrategyKind};
pub use domain::{
    clean_purchase_ledger, OrderStatus, PurchaseRecord, RawPurchaseRow, RawStockRow, SalesRecord,
    StockFieldResolver, StockRecord,
};
pub use engine::{
    Alert, AnalysisStrategy, AnalyticsReport, AnalyticsRequest, AnalyticsRuntime, AsinAnalytics,
    AsinFailure, AsinInput, BasicStrategy, ConfiguredStrategy, EnhancedStrategy, FallbackStrategy,
    InventoryIntelligence, ReportSummary,
};
pub use errors::{AnalyticsError, DomainError};
pub use priority::{PriorityCategory, PriorityResult, PriorityScorer};
pub use purchases::{
    CashFlowFlag, CashFlowSummary, PurchaseAnalytics, PurchaseAnalyticsEngine, PurchaseInsight,
    RoiRecommendation, UrgencyLevel,
};
pub use restock::{RestockPlan, RestockQuantityOptimizer};
pub use seasonality::SeasonalityModel;
pub use velocity::{TrendDirection, VelocityCalculator, VelocityResult};
