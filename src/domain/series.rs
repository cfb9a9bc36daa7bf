//! Time-indexed numeric series shared by every pipeline stage.
//!
//! A [`Series`] is immutable once built: each stage takes its inputs by
//! reference and produces a new series.

use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

/// Log returns, one per bar after the first.
pub type ReturnSeries = Series;
/// Position per period, aligned with a [`ReturnSeries`].
pub type PositionSeries = Series;
/// Position × return, per period.
pub type StrategyReturnSeries = Series;
/// Timestamp-wise sum of strategy returns across instruments.
pub type CombinedReturnSeries = Series;

impl Series {
    pub fn new(points: Vec<SeriesPoint>) -> Self {
        Self { points }
    }

    /// Zip timestamps and values; extra entries on either side are ignored.
    pub fn from_parts(timestamps: &[NaiveDateTime], values: &[f64]) -> Self {
        let points = timestamps
            .iter()
            .zip(values)
            .map(|(&timestamp, &value)| SeriesPoint { timestamp, value })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.points.first().map(|p| p.timestamp)
    }

    /// True when both series have the same length and identical timestamps.
    pub fn is_aligned_with(&self, other: &Series) -> bool {
        self.len() == other.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.timestamp == b.timestamp)
    }

    /// Drop every point earlier than `start`.
    pub fn trimmed_from(&self, start: NaiveDateTime) -> Series {
        Series {
            points: self
                .points
                .iter()
                .filter(|p| p.timestamp >= start)
                .copied()
                .collect(),
        }
    }

    pub fn value_index(&self) -> HashMap<NaiveDateTime, f64> {
        self.points.iter().map(|p| (p.timestamp, p.value)).collect()
    }

    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Series {
        Series {
            points: self
                .points
                .iter()
                .map(|p| SeriesPoint {
                    timestamp: p.timestamp,
                    value: f(p.value),
                })
                .collect(),
        }
    }
}

/// Sorted timestamps present in every series. Empty when `series` is empty.
pub fn common_timeline<'a>(series: impl IntoIterator<Item = &'a Series>) -> Vec<NaiveDateTime> {
    let mut common: Option<BTreeSet<NaiveDateTime>> = None;
    for s in series {
        let stamps: BTreeSet<NaiveDateTime> = s.points.iter().map(|p| p.timestamp).collect();
        common = Some(match common {
            None => stamps,
            Some(acc) => acc.intersection(&stamps).copied().collect(),
        });
    }
    common.map(|c| c.into_iter().collect()).unwrap_or_default()
}
