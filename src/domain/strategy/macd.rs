//! MACD crossover: long while the MACD line is above its signal line.

use super::{LONG, SHORT, Signal, check_window};
use crate::domain::error::AlgotesterError;
use crate::domain::indicator::calculate_macd;

pub use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};

pub fn validate(fast: usize, slow: usize, signal: usize) -> Result<(), AlgotesterError> {
    if fast == 0 || signal == 0 {
        return Err(AlgotesterError::invalid(
            "strategy",
            if fast == 0 { "macd_fast" } else { "macd_signal" },
            "period must be positive",
        ));
    }
    check_window("macd_slow", slow)?;
    check_window("macd_signal", signal)?;
    if fast >= slow {
        return Err(AlgotesterError::invalid(
            "strategy",
            "macd_slow",
            format!("slow period ({slow}) must exceed fast period ({fast})"),
        ));
    }
    Ok(())
}

pub fn signals(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Signal> {
    let macd = calculate_macd(closes, fast, slow, signal);

    macd.line
        .iter()
        .zip(&macd.signal)
        .map(|(line, sig)| match (line, sig) {
            (Some(l), Some(s)) if l > s => Signal::Position(LONG),
            (Some(_), Some(_)) => Signal::Position(SHORT),
            _ => Signal::Undefined,
        })
        .collect()
}
