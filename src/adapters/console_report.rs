//! Plain-text statistics table for the terminal.

use std::fmt::Write as _;
use std::io::Write;

use crate::domain::backtest::BacktestReport;
use crate::domain::combiner::COMBINED_LABEL;
use crate::domain::error::AlgotesterError;
use crate::domain::metrics::PerformanceStats;
use crate::ports::report_port::ReportPort;

/// Prints the statistics table to stdout.
pub struct ConsoleReport;

impl ReportPort for ConsoleReport {
    fn write(&self, report: &BacktestReport) -> Result<(), AlgotesterError> {
        let mut out = std::io::stdout().lock();
        out.write_all(render(report).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn stats_line(buf: &mut String, label: &str, kind: &str, stats: &PerformanceStats) {
    let _ = writeln!(
        buf,
        "{:<10} {:<13} {:>10} {:>10} {:>10} {:>10} {:>7} {:>9} {:>9}",
        label,
        kind,
        pct(stats.total_return),
        pct(stats.mean_annual_return),
        pct(stats.annualized_volatility),
        pct(stats.timeframe_volatility),
        stats.sharpe_display(),
        pct(stats.max_drawdown),
        pct(stats.average_drawdown),
    );
}

pub fn render(report: &BacktestReport) -> String {
    let mut buf = String::new();
    let _ = writeln!(
        buf,
        "\n=== {} | {} to {} ({}) ===",
        report.strategy, report.range.start, report.range.end, report.interval
    );
    let _ = writeln!(
        buf,
        "{:<10} {:<13} {:>10} {:>10} {:>10} {:>10} {:>7} {:>9} {:>9}",
        "Symbol", "Series", "Total", "Annual", "Ann.Vol", "Span.Vol", "Sharpe", "MaxDD", "AvgDD"
    );

    for inst in &report.instruments {
        stats_line(&mut buf, &inst.symbol, "buy-and-hold", &inst.buy_and_hold);
        stats_line(&mut buf, &inst.symbol, "strategy", &inst.strategy);
    }
    stats_line(&mut buf, COMBINED_LABEL, "buy-and-hold", &report.combined.buy_and_hold);
    stats_line(&mut buf, COMBINED_LABEL, "strategy", &report.combined.strategy);

    if !report.skipped.is_empty() {
        let _ = writeln!(buf, "\nSkipped:");
        for s in &report.skipped {
            let _ = writeln!(buf, "  {}: {}", s.symbol, s.reason);
        }
    }
    buf
}
