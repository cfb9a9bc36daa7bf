//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::console_report::ConsoleReport;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestReport};
use crate::domain::config_validation::{
    date_range_from_config, interval_from_config, risk_free_rate_from_config,
    strategy_from_config, symbols_from_config, validate_backtest_config,
    validate_strategy_config,
};
use crate::domain::error::AlgotesterError;
use crate::domain::strategy::{STRATEGY_NAMES, StrategyKind};
use crate::domain::universe::{load_universe, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSeriesStore;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Parser, Debug)]
#[command(name = "algotester", about = "Trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy name, overriding [strategy] name
        #[arg(short, long)]
        strategy: Option<String>,
        /// Comma-separated symbols, overriding [backtest] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Directory for the CSV report
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List available strategies and their defaults
    Strategies,
    /// Show stored data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbols: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), AlgotesterError> {
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            symbols,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, strategy.as_deref(), symbols.as_deref())
            } else {
                run_backtest(
                    &config,
                    strategy.as_deref(),
                    symbols.as_deref(),
                    output.as_deref(),
                )
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => run_strategies(),
        Command::Info { config, symbols } => run_info(&config, symbols.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, AlgotesterError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| AlgotesterError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// CLI symbols win over the config file.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, AlgotesterError> {
    match symbols_override {
        Some(list) => Ok(parse_symbols(list)?),
        None => symbols_from_config(config),
    }
}

pub fn build_backtest_config(
    config: &dyn ConfigPort,
    strategy_override: Option<&str>,
    symbols_override: Option<&str>,
    today: NaiveDate,
) -> Result<BacktestConfig, AlgotesterError> {
    Ok(BacktestConfig {
        symbols: resolve_symbols(symbols_override, config)?,
        range: date_range_from_config(config, today)?,
        interval: interval_from_config(config)?,
        risk_free_rate: risk_free_rate_from_config(config)?,
        strategy: strategy_from_config(config, strategy_override)?,
    })
}

pub fn data_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("backtest", "data_dir")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// `--output` wins over `[report] output_dir`; no directory means console only.
pub fn output_dir(output_override: Option<&Path>, config: &dyn ConfigPort) -> Option<PathBuf> {
    output_override.map(Path::to_path_buf).or_else(|| {
        config
            .get_string("report", "output_dir")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    })
}

fn run_backtest(
    config_path: &Path,
    strategy_override: Option<&str>,
    symbols_override: Option<&str>,
    output_override: Option<&Path>,
) -> Result<(), AlgotesterError> {
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter, strategy_override, symbols_override, today())?;
    info!("Strategy: {}", bt_config.strategy);

    let store = CsvAdapter::new(data_dir(&adapter));

    let mut reporters: Vec<Box<dyn ReportPort>> = vec![Box::new(ConsoleReport)];
    if let Some(dir) = output_dir(output_override, &adapter) {
        reporters.push(Box::new(CsvReportAdapter::new(dir)));
    }

    let report = run_backtest_pipeline(&store, &bt_config)?;
    for reporter in &reporters {
        reporter.write(&report)?;
    }
    Ok(())
}

/// Fetch, run and return the report. Symbols without data are skipped.
pub fn run_backtest_pipeline(
    store: &dyn PriceSeriesStore,
    bt_config: &BacktestConfig,
) -> Result<BacktestReport, AlgotesterError> {
    info!(
        "Fetching {} symbols ({})...",
        bt_config.symbols.len(),
        bt_config.interval
    );
    let universe = load_universe(store, &bt_config.symbols, &bt_config.range, bt_config.interval)?;

    let mut report = backtest_engine::run_backtest(&universe.instruments, bt_config)?;
    let mut skipped = universe.skipped;
    skipped.append(&mut report.skipped);
    report.skipped = skipped;
    Ok(report)
}

fn run_dry_run(
    config_path: &Path,
    strategy_override: Option<&str>,
    symbols_override: Option<&str>,
) -> Result<(), AlgotesterError> {
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter, strategy_override, symbols_override, today())?;

    info!("Config validated successfully");
    info!("  symbols:  {}", bt_config.symbols.join(", "));
    info!(
        "  range:    {} to {} ({:.2} years)",
        bt_config.range.start,
        bt_config.range.end,
        bt_config.range.span_years()
    );
    info!("  interval: {}", bt_config.interval);
    info!("  strategy: {}", bt_config.strategy);
    info!(
        "  minimum bars per symbol: {}",
        bt_config.strategy.min_bars()
    );
    info!("Dry run complete: configuration is valid");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), AlgotesterError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter, today())?;
    validate_strategy_config(&adapter)?;
    info!("Configuration is valid.");
    Ok(())
}

fn run_strategies() -> Result<(), AlgotesterError> {
    for name in STRATEGY_NAMES {
        let strategy = StrategyKind::default_for(name)?;
        println!(
            "{:<8} default {:<22} needs {} bars",
            name,
            strategy.to_string(),
            strategy.min_bars()
        );
    }
    Ok(())
}

fn run_info(config_path: &Path, symbols_override: Option<&str>) -> Result<(), AlgotesterError> {
    let adapter = load_config(config_path)?;
    let symbols = resolve_symbols(symbols_override, &adapter)?;
    let interval = interval_from_config(&adapter)?;
    let store = CsvAdapter::new(data_dir(&adapter));

    for symbol in &symbols {
        match store.data_range(symbol, interval)? {
            Some((first, last, count)) => {
                println!(
                    "{} ({}): {} bars, {} to {}",
                    symbol, interval, count, first, last
                );
            }
            None => println!("{} ({}): no data found", symbol, interval),
        }
    }
    Ok(())
}
