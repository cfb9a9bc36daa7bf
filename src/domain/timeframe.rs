//! Sampling intervals, period shorthands and date ranges.

use chrono::{Duration, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const TRADING_MINUTES_PER_DAY: f64 = 390.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interval {
    Minute1,
    Minute2,
    Minute5,
    Minute15,
    Minute30,
    Minute60,
    Minute90,
    Hour1,
    #[default]
    Day1,
    Day5,
    Week1,
    Month1,
    Month3,
}

impl Interval {
    pub const ALL: [Interval; 13] = [
        Interval::Minute1,
        Interval::Minute2,
        Interval::Minute5,
        Interval::Minute15,
        Interval::Minute30,
        Interval::Minute60,
        Interval::Minute90,
        Interval::Hour1,
        Interval::Day1,
        Interval::Day5,
        Interval::Week1,
        Interval::Month1,
        Interval::Month3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute2 => "2m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Minute60 => "60m",
            Interval::Minute90 => "90m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Day5 => "5d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
            Interval::Month3 => "3mo",
        }
    }

    /// Number of sampling periods in one trading year.
    ///
    /// Intraday intervals assume a 6.5 hour session.
    pub fn periods_per_year(&self) -> f64 {
        let intraday = |minutes: f64| TRADING_DAYS_PER_YEAR * TRADING_MINUTES_PER_DAY / minutes;
        match self {
            Interval::Minute1 => intraday(1.0),
            Interval::Minute2 => intraday(2.0),
            Interval::Minute5 => intraday(5.0),
            Interval::Minute15 => intraday(15.0),
            Interval::Minute30 => intraday(30.0),
            Interval::Minute60 | Interval::Hour1 => intraday(60.0),
            Interval::Minute90 => intraday(90.0),
            Interval::Day1 => TRADING_DAYS_PER_YEAR,
            Interval::Day5 => TRADING_DAYS_PER_YEAR / 5.0,
            Interval::Week1 => 52.0,
            Interval::Month1 => 12.0,
            Interval::Month3 => 4.0,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Interval::ALL
            .iter()
            .find(|i| i.as_str() == needle)
            .copied()
            .ok_or_else(|| format!("unknown interval '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

/// A trailing look-back shorthand such as `5d`, `1wk`, `6mo` or `5y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub count: u32,
    pub unit: PeriodUnit,
}

impl Period {
    /// First date of the period ending on `end`.
    pub fn start_from(&self, end: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            PeriodUnit::Day => end.checked_sub_signed(Duration::days(self.count as i64)),
            PeriodUnit::Week => end.checked_sub_signed(Duration::weeks(self.count as i64)),
            PeriodUnit::Month => end.checked_sub_months(Months::new(self.count)),
            PeriodUnit::Year => end.checked_sub_months(Months::new(self.count.saturating_mul(12))),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, suffix) = s.split_at(split);

        let count: u32 = digits
            .parse()
            .map_err(|_| format!("period '{}' must start with a number", s))?;
        if count == 0 {
            return Err(format!("period '{}' must be positive", s));
        }

        let unit = match suffix {
            "d" => PeriodUnit::Day,
            "wk" | "w" => PeriodUnit::Week,
            "mo" | "m" => PeriodUnit::Month,
            "y" => PeriodUnit::Year,
            _ => return Err(format!("unknown period unit in '{}'", s)),
        };

        Ok(Period { count, unit })
    }
}

/// Inclusive calendar range of a backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn trailing(period: Period, end: NaiveDate) -> Option<Self> {
        period.start_from(end).map(|start| Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Elapsed calendar time in years.
    pub fn span_years(&self) -> f64 {
        (self.end - self.start).num_days() as f64 / DAYS_PER_YEAR
    }
}
