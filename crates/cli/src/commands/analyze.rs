use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use stockpulse_core::config::{ConfigOverrides, EngineConfig, LoadOptions, StrategyKind};
use stockpulse_core::{AnalyticsRequest, AnalyticsRuntime, InventoryIntelligence};

use super::{CommandResult, EXIT_CONFIG, EXIT_INPUT};
use crate::loader;

const COMMAND: &str = "analyze";

#[derive(Debug, Clone, Default, Args)]
pub struct AnalyzeArgs {
    #[arg(long, help = "Order history CSV (defaults to sources.orders_path)")]
    pub orders: Option<PathBuf>,
    #[arg(long, help = "Stock snapshot CSV (defaults to sources.stock_path)")]
    pub stock: Option<PathBuf>,
    #[arg(long, help = "Purchase ledger CSV (defaults to sources.purchases_path)")]
    pub purchases: Option<PathBuf>,
    #[arg(long = "as-of", help = "Analysis date YYYY-MM-DD (defaults to today)")]
    pub as_of: Option<NaiveDate>,
    #[arg(long, help = "Config file path (defaults to stockpulse.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, value_parser = parse_strategy, help = "Analysis strategy: enhanced|basic")]
    pub strategy: Option<StrategyKind>,
    #[arg(long = "lead-time-days", help = "Supplier lead time override")]
    pub lead_time_days: Option<u32>,
}

fn parse_strategy(value: &str) -> Result<StrategyKind, String> {
    value.parse().map_err(|error: stockpulse_core::ConfigError| error.to_string())
}

impl AnalyzeArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                lead_time_days: self.lead_time_days,
                strategy: self.strategy,
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run(args: AnalyzeArgs) -> CommandResult {
    let config = match EngineConfig::load(args.load_options()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let Some(orders_path) = args.orders.or_else(|| config.sources.orders_path.clone()) else {
        return missing_input("orders");
    };
    let Some(stock_path) = args.stock.or_else(|| config.sources.stock_path.clone()) else {
        return missing_input("stock");
    };
    let purchases_path = args.purchases.or_else(|| config.sources.purchases_path.clone());

    let orders = match loader::load_orders_file(&orders_path) {
        Ok(orders) => orders,
        Err(error) => return input_failure(error),
    };
    let stock = match loader::load_stock_file(&stock_path) {
        Ok(stock) => stock,
        Err(error) => return input_failure(error),
    };
    let purchases = match purchases_path.as_deref().map(loader::load_purchases_file) {
        Some(Ok(purchases)) => purchases,
        Some(Err(error)) => return input_failure(error),
        None => Vec::new(),
    };

    let runtime = match AnalyticsRuntime::from_config(&config) {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                error.error_class(),
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let as_of = args.as_of.unwrap_or_else(|| today(config.analysis.utc_offset_minutes));
    let report = runtime.analyze(&AnalyticsRequest {
        as_of,
        orders: &orders,
        stock: &stock,
        purchases: &purchases,
    });

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult::document(output),
        Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 1),
    }
}

fn today(utc_offset_minutes: i32) -> NaiveDate {
    (Utc::now() + Duration::minutes(i64::from(utc_offset_minutes))).date_naive()
}

fn missing_input(kind: &str) -> CommandResult {
    CommandResult::failure(
        COMMAND,
        "input",
        format!("no {kind} CSV given; pass --{kind} or set sources.{kind}_path"),
        EXIT_INPUT,
    )
}

fn input_failure(error: anyhow::Error) -> CommandResult {
    CommandResult::failure(COMMAND, "input", format!("{error:#}"), EXIT_INPUT)
}
