//! Price store over a directory of CSV files.
//!
//! One file per symbol and interval: `<dir>/<SYMBOL>_<interval>.csv` with a
//! `date,open,high,low,close` header. Extra trailing columns are ignored.

use crate::domain::error::AlgotesterError;
use crate::domain::ohlcv::Bar;
use crate::domain::timeframe::{DateRange, Interval};
use crate::ports::data_port::PriceSeriesStore;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: Interval) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }

    fn read_all(&self, symbol: &str, interval: Interval) -> Result<Vec<Bar>, AlgotesterError> {
        let path = self.csv_path(symbol, interval);
        if !path.exists() {
            return Err(AlgotesterError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| AlgotesterError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| AlgotesterError::DataSource {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;
            let line = row + 2;

            let date_str = record.get(0).ok_or_else(|| AlgotesterError::DataSource {
                reason: format!("{} line {}: missing date column", path.display(), line),
            })?;
            let timestamp = parse_timestamp(date_str).ok_or_else(|| {
                AlgotesterError::DataSource {
                    reason: format!(
                        "{} line {}: invalid date '{}'",
                        path.display(),
                        line,
                        date_str
                    ),
                }
            })?;

            let price = |idx: usize, name: &str| -> Result<f64, AlgotesterError> {
                record
                    .get(idx)
                    .ok_or_else(|| AlgotesterError::DataSource {
                        reason: format!("{} line {}: missing {} column", path.display(), line, name),
                    })?
                    .trim()
                    .parse()
                    .map_err(|e| AlgotesterError::DataSource {
                        reason: format!("{} line {}: invalid {} value: {}", path.display(), line, name, e),
                    })
            };

            bars.push(Bar {
                timestamp,
                open: price(1, "open")?,
                high: price(2, "high")?,
                low: price(3, "low")?,
                close: price(4, "close")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl PriceSeriesStore for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        range: &DateRange,
        interval: Interval,
    ) -> Result<Vec<Bar>, AlgotesterError> {
        let mut bars = self.read_all(symbol, interval)?;
        bars.retain(|b| range.contains(b.timestamp.date()));
        Ok(bars)
    }

    fn data_range(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, AlgotesterError> {
        let bars = match self.read_all(symbol, interval) {
            Ok(bars) => bars,
            Err(AlgotesterError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}
