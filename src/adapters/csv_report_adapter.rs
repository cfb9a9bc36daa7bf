//! CSV report adapter implementing ReportPort.
//!
//! Writes two files into the output directory: `stats.csv` with one row per
//! instrument and statistic set plus the combined rows, and `curves.csv` with
//! every curve as a column keyed by timestamp.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::domain::backtest::BacktestReport;
use crate::domain::combiner::COMBINED_LABEL;
use crate::domain::error::AlgotesterError;
use crate::domain::metrics::PerformanceStats;
use crate::domain::series::Series;
use crate::ports::report_port::ReportPort;

pub const STATS_FILE: &str = "stats.csv";
pub const CURVES_FILE: &str = "curves.csv";
pub const CSV_REPORT_FILES: [&str; 2] = [STATS_FILE, CURVES_FILE];

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

#[derive(Debug, Serialize)]
struct StatsRow<'a> {
    symbol: &'a str,
    series: &'static str,
    strategy: String,
    periods: usize,
    total_return: f64,
    mean_annual_return: f64,
    annualized_volatility: f64,
    timeframe_volatility: f64,
    sharpe_ratio: String,
    max_drawdown: f64,
    average_drawdown: f64,
}

impl<'a> StatsRow<'a> {
    fn new(symbol: &'a str, series: &'static str, strategy: String, stats: &PerformanceStats) -> Self {
        Self {
            symbol,
            series,
            strategy,
            periods: stats.periods,
            total_return: stats.total_return,
            mean_annual_return: stats.mean_annual_return,
            annualized_volatility: stats.annualized_volatility,
            timeframe_volatility: stats.timeframe_volatility,
            sharpe_ratio: stats
                .sharpe_ratio
                .map_or_else(|| "NaN".to_string(), |s| s.to_string()),
            max_drawdown: stats.max_drawdown,
            average_drawdown: stats.average_drawdown,
        }
    }
}

fn stats_rows(report: &BacktestReport) -> Vec<StatsRow<'_>> {
    let strategy = report.strategy.to_string();
    let mut rows = Vec::with_capacity(2 * (report.instruments.len() + 1));
    for inst in &report.instruments {
        rows.push(StatsRow::new(&inst.symbol, "buy_and_hold", strategy.clone(), &inst.buy_and_hold));
        rows.push(StatsRow::new(&inst.symbol, "strategy", strategy.clone(), &inst.strategy));
    }
    rows.push(StatsRow::new(
        COMBINED_LABEL,
        "buy_and_hold",
        strategy.clone(),
        &report.combined.buy_and_hold,
    ));
    rows.push(StatsRow::new(
        COMBINED_LABEL,
        "strategy",
        strategy,
        &report.combined.strategy,
    ));
    rows
}

/// Column names and their series, in output order.
fn curve_columns(report: &BacktestReport) -> Vec<(String, &Series)> {
    let mut columns = Vec::new();
    for inst in &report.instruments {
        columns.push((format!("{}_strategy", inst.symbol), &inst.cumulative));
        columns.push((format!("{}_buy_and_hold", inst.symbol), &inst.growth));
    }
    columns.push((
        format!("{}_strategy", COMBINED_LABEL),
        &report.combined.cumulative,
    ));
    columns.push((
        format!("{}_returns", COMBINED_LABEL),
        &report.combined.strategy_returns,
    ));
    columns
}

fn write_stats(report: &BacktestReport, path: &Path) -> Result<(), AlgotesterError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in stats_rows(report) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_curves(report: &BacktestReport, path: &Path) -> Result<(), AlgotesterError> {
    let columns = curve_columns(report);

    let mut table: BTreeMap<NaiveDateTime, Vec<Option<f64>>> = BTreeMap::new();
    for (idx, (_, series)) in columns.iter().enumerate() {
        for point in &series.points {
            table
                .entry(point.timestamp)
                .or_insert_with(|| vec![None; columns.len()])[idx] = Some(point.value);
        }
    }

    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["timestamp".to_string()];
    header.extend(columns.iter().map(|(name, _)| name.clone()));
    wtr.write_record(&header)?;

    for (timestamp, values) in &table {
        let mut record = vec![timestamp.format("%Y-%m-%d %H:%M:%S").to_string()];
        record.extend(
            values
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &BacktestReport) -> Result<(), AlgotesterError> {
        fs::create_dir_all(&self.output_dir)?;

        let stats_path = self.output_dir.join(STATS_FILE);
        write_stats(report, &stats_path)?;
        let curves_path = self.output_dir.join(CURVES_FILE);
        write_curves(report, &curves_path)?;

        info!("Report written to: {}", self.output_dir.display());
        Ok(())
    }
}
