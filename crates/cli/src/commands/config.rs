use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use stockpulse_core::config::{EngineConfig, LoadOptions};
use toml::Value;

use super::{CommandResult, EXIT_CONFIG};

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let options = LoadOptions {
        require_file: config_path.is_some(),
        config_path: config_path.clone(),
        ..LoadOptions::default()
    };
    let config = match EngineConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let config_file_path = config_path.or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::document(lines.join("\n"))
}

struct Field {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

fn field(key_path: &'static str, value: String, env_keys: &'static [&'static str]) -> Field {
    Field { key_path, value, env_keys }
}

fn fields(config: &EngineConfig) -> Vec<Field> {
    let analysis = &config.analysis;
    let sources = &config.sources;
    vec![
        field(
            "analysis.lead_time_days",
            analysis.lead_time_days.to_string(),
            &["STOCKPULSE_LEAD_TIME_DAYS"],
        ),
        field(
            "analysis.include_target_day",
            analysis.include_target_day.to_string(),
            &["STOCKPULSE_INCLUDE_TARGET_DAY"],
        ),
        field(
            "analysis.utc_offset_minutes",
            analysis.utc_offset_minutes.to_string(),
            &["STOCKPULSE_UTC_OFFSET_MINUTES"],
        ),
        field(
            "analysis.strategy",
            analysis.strategy.as_str().to_string(),
            &["STOCKPULSE_STRATEGY"],
        ),
        field(
            "analysis.skip_zero_velocity",
            analysis.skip_zero_velocity.to_string(),
            &["STOCKPULSE_SKIP_ZERO_VELOCITY"],
        ),
        field(
            "purchases.window_months",
            config.purchases.window_months.to_string(),
            &["STOCKPULSE_PURCHASE_WINDOW_MONTHS"],
        ),
        field(
            "sources.orders_path",
            display_path(sources.orders_path.as_deref()),
            &["STOCKPULSE_ORDERS_PATH"],
        ),
        field(
            "sources.stock_path",
            display_path(sources.stock_path.as_deref()),
            &["STOCKPULSE_STOCK_PATH"],
        ),
        field(
            "sources.purchases_path",
            display_path(sources.purchases_path.as_deref()),
            &["STOCKPULSE_PURCHASES_PATH"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["STOCKPULSE_LOGGING_LEVEL", "STOCKPULSE_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            config.logging.format.as_str().to_string(),
            &["STOCKPULSE_LOGGING_FORMAT", "STOCKPULSE_LOG_FORMAT"],
        ),
    ]
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| "<unset>".to_string())
}

fn detect_config_path() -> Option<PathBuf> {
    ["stockpulse.toml", "config/stockpulse.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
