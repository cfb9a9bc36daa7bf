#![allow(dead_code)]

use algotester::domain::backtest::BacktestConfig;
use algotester::domain::error::AlgotesterError;
pub use algotester::domain::ohlcv::{Bar, Instrument};
use algotester::domain::strategy::StrategyKind;
use algotester::domain::timeframe::{DateRange, Interval};
use algotester::ports::data_port::PriceSeriesStore;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

pub struct MockPriceStore {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceStore {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceSeriesStore for MockPriceStore {
    fn fetch_bars(
        &self,
        symbol: &str,
        range: &DateRange,
        _interval: Interval,
    ) -> Result<Vec<Bar>, AlgotesterError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(AlgotesterError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| range.contains(b.timestamp.date()))
                .cloned()
                .collect()),
            None => Err(AlgotesterError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn data_range(
        &self,
        symbol: &str,
        _interval: Interval,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, AlgotesterError> {
        Ok(self.data.get(symbol).and_then(|bars| {
            let first = bars.first()?.timestamp;
            let last = bars.last()?.timestamp;
            Some((first, last, bars.len()))
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> Bar {
    Bar {
        timestamp: NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
    }
}

/// Daily bars from `start_date`, one per close.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<Bar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
        })
        .collect()
}

/// Deterministic zig-zag around an upward drift.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| start_price + i as f64 * 0.5 + [0.0, 2.0, -1.0, 3.0, -2.0][i % 5])
        .collect();
    bars_from_closes(start_date, &closes)
}

pub fn instrument(symbol: &str, bars: Vec<Bar>) -> Instrument {
    Instrument::new(symbol, bars)
}

pub fn sample_config(symbols: &[&str], strategy: StrategyKind) -> BacktestConfig {
    BacktestConfig {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        range: DateRange::new(date(2024, 1, 1), date(2025, 1, 1)),
        interval: Interval::Day1,
        risk_free_rate: 0.045,
        strategy,
    }
}
