pub mod commands;
pub mod loader;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stockpulse_core::config::{EngineConfig, LoadOptions, LogFormat, LoggingConfig};

use commands::analyze::AnalyzeArgs;

#[derive(Debug, Parser)]
#[command(
    name = "stockpulse",
    about = "Stockpulse inventory analytics CLI",
    long_about = "Score restock priority, order quantities, purchase cadence, and inventory age \
                  from exported order, stock, and purchase CSVs.",
    after_help = "Examples:\n  stockpulse analyze --orders orders.csv --stock stock.csv\n  \
                  stockpulse analyze --orders orders.csv --stock stock.csv --as-of 2024-11-20\n  \
                  stockpulse config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Analyze inputs and print the JSON analytics report")]
    Analyze(AnalyzeArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config {
        #[arg(long, help = "Config file path (defaults to stockpulse.toml)")]
        config: Option<PathBuf>,
    },
}

/// Logs go to stderr; stdout carries only command output.
pub fn init_logging(config: &LoggingConfig) {
    use tracing::Level;

    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let load_options = match &cli.command {
        Command::Analyze(args) => args.load_options(),
        Command::Config { config } => LoadOptions {
            config_path: config.clone(),
            ..LoadOptions::default()
        },
    };
    // Invalid config is reported by the command itself; logging falls back to defaults.
    let logging = EngineConfig::load(load_options)
        .map(|config| config.logging)
        .unwrap_or_else(|_| EngineConfig::default().logging);
    init_logging(&logging);

    let result = match cli.command {
        Command::Analyze(args) => commands::analyze::run(args),
        Command::Config { config } => commands::config::run(config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
