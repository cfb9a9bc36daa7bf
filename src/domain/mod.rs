//! Core domain types and logic.

pub mod backtest;
pub mod combiner;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod returns;
pub mod series;
pub mod strategy;
pub mod timeframe;
pub mod universe;
