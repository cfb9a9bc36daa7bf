//! Report generation port trait.

use crate::domain::backtest::BacktestReport;
use crate::domain::error::AlgotesterError;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &BacktestReport) -> Result<(), AlgotesterError>;
}
