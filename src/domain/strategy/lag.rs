//! Lagged weighted sum of recent returns.
//!
//! The signal at bar t is the sign of sum_k w_k / sum(w) * r[t-k+1] for
//! k = 1..=L, where r[t] is the return realised at bar t. After the one-period
//! shift the return at bar t is traded on r[t-1] .. r[t-L]. The sign and
//! magnitude of the weights decide between momentum and mean reversion.

use super::{LONG, SHORT, Signal, check_window};
use crate::domain::error::AlgotesterError;

pub const DEFAULT_WEIGHTS: [f64; 3] = [-2.0, 4.0, -1.0];

pub fn validate(weights: &[f64]) -> Result<(), AlgotesterError> {
    if weights.is_empty() {
        return Err(AlgotesterError::invalid(
            "strategy",
            "lag_weights",
            "at least one weight is required",
        ));
    }
    check_window("lag_weights", weights.len())?;
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(AlgotesterError::invalid(
            "strategy",
            "lag_weights",
            "weights must be finite",
        ));
    }
    if weights.iter().sum::<f64>() == 0.0 {
        return Err(AlgotesterError::invalid(
            "strategy",
            "lag_weights",
            "weights must not sum to zero",
        ));
    }
    Ok(())
}

/// `returns[j]` is realised at bar `j + 1`; the output has one entry per bar.
pub fn signals(returns: &[f64], weights: &[f64]) -> Vec<Signal> {
    let bars = returns.len() + 1;
    let lags = weights.len();
    let total: f64 = weights.iter().sum();

    (0..bars)
        .map(|t| {
            if lags == 0 || t < lags {
                return Signal::Undefined;
            }
            let weighted: f64 = weights
                .iter()
                .enumerate()
                .map(|(k, w)| w / total * returns[t - 1 - k])
                .sum();
            if weighted > 0.0 {
                Signal::Position(LONG)
            } else {
                Signal::Position(SHORT)
            }
        })
        .collect()
}
