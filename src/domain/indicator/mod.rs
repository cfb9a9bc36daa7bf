//! Technical indicators over close-price slices.
//!
//! Every function returns a vector the same length as its input. `None`
//! marks warm-up entries where the indicator is not yet defined.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::{calculate_ema, ema_of_defined};
pub use macd::{MacdSeries, calculate_macd};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

/// Index of the first defined value, if any.
pub fn first_defined(values: &[Option<f64>]) -> Option<usize> {
    values.iter().position(Option::is_some)
}
