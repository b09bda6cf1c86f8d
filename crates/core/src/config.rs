use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineConfig {
    pub analysis: AnalysisConfig,
    pub purchases: PurchaseConfig,
    pub sources: SourcesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub lead_time_days: u32,
    pub include_target_day: bool,
    pub utc_offset_minutes: i32,
    pub strategy: StrategyKind,
    pub skip_zero_velocity: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PurchaseConfig {
    pub window_months: u32,
}

/// Default input locations, injected by the caller instead of living in code.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SourcesConfig {
    pub orders_path: Option<PathBuf>,
    pub stock_path: Option<PathBuf>,
    pub purchases_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Enhanced,
    Basic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub lead_time_days: Option<u32>,
    pub utc_offset_minutes: Option<i32>,
    pub strategy: Option<StrategyKind>,
    pub purchase_window_months: Option<u32>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("invalid TOML in config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("config references unset environment variable `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("`${{` in config file is never closed")]
    UnterminatedInterpolation,
    #[error("environment variable `{key}` has invalid value `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("{0}")]
    Validation(String),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig {
                lead_time_days: 30,
                include_target_day: false,
                utc_offset_minutes: 0,
                strategy: StrategyKind::Enhanced,
                skip_zero_velocity: true,
            },
            purchases: PurchaseConfig { window_months: 12 },
            sources: SourcesConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enhanced => "enhanced",
            Self::Basic => "basic",
        }
    }
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enhanced" => Ok(Self::Enhanced),
            "basic" => Ok(Self::Basic),
            other => Err(ConfigError::Validation(format!(
                "unsupported analysis strategy `{other}` (expected enhanced|basic)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("stockpulse.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(analysis) = patch.analysis {
            if let Some(lead_time_days) = analysis.lead_time_days {
                self.analysis.lead_time_days = lead_time_days;
            }
            if let Some(include_target_day) = analysis.include_target_day {
                self.analysis.include_target_day = include_target_day;
            }
            if let Some(utc_offset_minutes) = analysis.utc_offset_minutes {
                self.analysis.utc_offset_minutes = utc_offset_minutes;
            }
            if let Some(strategy) = analysis.strategy {
                self.analysis.strategy = strategy;
            }
            if let Some(skip_zero_velocity) = analysis.skip_zero_velocity {
                self.analysis.skip_zero_velocity = skip_zero_velocity;
            }
        }

        if let Some(purchases) = patch.purchases {
            if let Some(window_months) = purchases.window_months {
                self.purchases.window_months = window_months;
            }
        }

        if let Some(sources) = patch.sources {
            if let Some(orders_path) = sources.orders_path {
                self.sources.orders_path = Some(orders_path);
            }
            if let Some(stock_path) = sources.stock_path {
                self.sources.stock_path = Some(stock_path);
            }
            if let Some(purchases_path) = sources.purchases_path {
                self.sources.purchases_path = Some(purchases_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOCKPULSE_LEAD_TIME_DAYS") {
            self.analysis.lead_time_days = parse_env("STOCKPULSE_LEAD_TIME_DAYS", &value)?;
        }
        if let Some(value) = read_env("STOCKPULSE_INCLUDE_TARGET_DAY") {
            self.analysis.include_target_day =
                parse_env("STOCKPULSE_INCLUDE_TARGET_DAY", &value)?;
        }
        if let Some(value) = read_env("STOCKPULSE_UTC_OFFSET_MINUTES") {
            self.analysis.utc_offset_minutes = parse_env("STOCKPULSE_UTC_OFFSET_MINUTES", &value)?;
        }
        if let Some(value) = read_env("STOCKPULSE_STRATEGY") {
            self.analysis.strategy = value.parse()?;
        }
        if let Some(value) = read_env("STOCKPULSE_SKIP_ZERO_VELOCITY") {
            self.analysis.skip_zero_velocity =
                parse_env("STOCKPULSE_SKIP_ZERO_VELOCITY", &value)?;
        }

        if let Some(value) = read_env("STOCKPULSE_PURCHASE_WINDOW_MONTHS") {
            self.purchases.window_months =
                parse_env("STOCKPULSE_PURCHASE_WINDOW_MONTHS", &value)?;
        }

        if let Some(value) = read_env("STOCKPULSE_ORDERS_PATH") {
            self.sources.orders_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("STOCKPULSE_STOCK_PATH") {
            self.sources.stock_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("STOCKPULSE_PURCHASES_PATH") {
            self.sources.purchases_path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("STOCKPULSE_LOGGING_LEVEL").or_else(|| read_env("STOCKPULSE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOCKPULSE_LOGGING_FORMAT").or_else(|| read_env("STOCKPULSE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(lead_time_days) = overrides.lead_time_days {
            self.analysis.lead_time_days = lead_time_days;
        }
        if let Some(utc_offset_minutes) = overrides.utc_offset_minutes {
            self.analysis.utc_offset_minutes = utc_offset_minutes;
        }
        if let Some(strategy) = overrides.strategy {
            self.analysis.strategy = strategy;
        }
        if let Some(window_months) = overrides.purchase_window_months {
            self.purchases.window_months = window_months;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_analysis(&self.analysis)?;
        validate_purchases(&self.purchases)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("stockpulse.toml"), PathBuf::from("config/stockpulse.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references from the process environment.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    if analysis.lead_time_days == 0 || analysis.lead_time_days > 365 {
        return Err(ConfigError::Validation(
            "analysis.lead_time_days must be in range 1..=365".to_string(),
        ));
    }

    if !(-720..=840).contains(&analysis.utc_offset_minutes) {
        return Err(ConfigError::Validation(
            "analysis.utc_offset_minutes must be in range -720..=840".to_string(),
        ));
    }

    Ok(())
}

fn validate_purchases(purchases: &PurchaseConfig) -> Result<(), ConfigError> {
    if purchases.window_months == 0 || purchases.window_months > 60 {
        return Err(ConfigError::Validation(
            "purchases.window_months must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    analysis: Option<AnalysisPatch>,
    purchases: Option<PurchasePatch>,
    sources: Option<SourcesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    lead_time_days: Option<u32>,
    include_target_day: Option<bool>,
    utc_offset_minutes: Option<i32>,
    strategy: Option<StrategyKind>,
    skip_zero_velocity: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PurchasePatch {
    window_months: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SourcesPatch {
    orders_path: Option<PathBuf>,
    stock_path: Option<PathBuf>,
    purchases_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
