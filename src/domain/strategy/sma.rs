//! Moving-average crossover: long while the short SMA is above the long SMA.

use super::{LONG, SHORT, Signal, check_window};
use crate::domain::error::AlgotesterError;
use crate::domain::indicator::calculate_sma;

pub const DEFAULT_SHORT: usize = 40;
pub const DEFAULT_LONG: usize = 100;

pub fn validate(short_window: usize, long_window: usize) -> Result<(), AlgotesterError> {
    if short_window == 0 {
        return Err(AlgotesterError::invalid(
            "strategy",
            "sma_short",
            "window must be positive",
        ));
    }
    check_window("sma_long", long_window)?;
    if short_window >= long_window {
        return Err(AlgotesterError::invalid(
            "strategy",
            "sma_long",
            format!("long window ({long_window}) must exceed short window ({short_window})"),
        ));
    }
    Ok(())
}

pub fn signals(closes: &[f64], short_window: usize, long_window: usize) -> Vec<Signal> {
    let short = calculate_sma(closes, short_window);
    let long = calculate_sma(closes, long_window);

    short
        .iter()
        .zip(&long)
        .map(|(s, l)| match (s, l) {
            (Some(s), Some(l)) if s > l => Signal::Position(LONG),
            (Some(_), Some(_)) => Signal::Position(SHORT),
            _ => Signal::Undefined,
        })
        .collect()
}
