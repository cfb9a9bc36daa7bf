//! Price data access port trait.

use crate::domain::error::AlgotesterError;
use crate::domain::ohlcv::Bar;
use crate::domain::timeframe::{DateRange, Interval};
use chrono::NaiveDateTime;

pub trait PriceSeriesStore {
    /// Bars for `symbol` within `range`, ascending by timestamp.
    ///
    /// An unknown symbol is `NoData`; an empty result is returned as such and
    /// left to the caller.
    fn fetch_bars(
        &self,
        symbol: &str,
        range: &DateRange,
        interval: Interval,
    ) -> Result<Vec<Bar>, AlgotesterError>;

    /// First timestamp, last timestamp and bar count stored for `symbol`.
    fn data_range(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, AlgotesterError>;
}
