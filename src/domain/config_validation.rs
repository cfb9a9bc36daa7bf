//! Configuration parsing and validation.
//!
//! Every field is checked before a backtest runs. The parsers here are also
//! what the CLI uses to build the run configuration, so a config that
//! validates is a config that loads.

use chrono::NaiveDate;

use crate::domain::error::AlgotesterError;
use crate::domain::strategy::{StrategyKind, lag, macd, rsi, sma};
use crate::domain::timeframe::{DateRange, Interval, Period};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.045;
pub const DEFAULT_STRATEGY: &str = "sma";

pub fn validate_backtest_config(
    config: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<(), AlgotesterError> {
    symbols_from_config(config)?;
    date_range_from_config(config, today)?;
    interval_from_config(config)?;
    risk_free_rate_from_config(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), AlgotesterError> {
    strategy_from_config(config, None).map(|_| ())
}

/// `[backtest] symbols`, falling back to the single `symbol` key.
pub fn symbols_from_config(config: &dyn ConfigPort) -> Result<Vec<String>, AlgotesterError> {
    let list = config
        .get_string("backtest", "symbols")
        .or_else(|| config.get_string("backtest", "symbol"))
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AlgotesterError::ConfigMissing {
            section: "backtest".into(),
            key: "symbols".into(),
        })?;
    Ok(parse_symbols(&list)?)
}

/// Explicit `start_date` wins over `period`; `end_date` defaults to `today`.
pub fn date_range_from_config(
    config: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<DateRange, AlgotesterError> {
    let end = match config.get_string("backtest", "end_date") {
        Some(s) => parse_date(&s, "end_date")?,
        None => today,
    };

    let range = match (
        config.get_string("backtest", "start_date"),
        config.get_string("backtest", "period"),
    ) {
        (Some(s), _) => DateRange::new(parse_date(&s, "start_date")?, end),
        (None, Some(p)) => {
            let period: Period = p
                .parse()
                .map_err(|e: String| AlgotesterError::invalid("backtest", "period", e))?;
            DateRange::trailing(period, end).ok_or_else(|| {
                AlgotesterError::invalid("backtest", "period", "period reaches before year 1")
            })?
        }
        (None, None) => {
            return Err(AlgotesterError::ConfigMissing {
                section: "backtest".into(),
                key: "start_date".into(),
            });
        }
    };

    if range.start >= range.end {
        return Err(AlgotesterError::invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(range)
}

pub fn interval_from_config(config: &dyn ConfigPort) -> Result<Interval, AlgotesterError> {
    match config.get_string("backtest", "interval") {
        Some(s) => s
            .parse()
            .map_err(|e: String| AlgotesterError::invalid("backtest", "interval", e)),
        None => Ok(Interval::default()),
    }
}

pub fn risk_free_rate_from_config(config: &dyn ConfigPort) -> Result<f64, AlgotesterError> {
    let value = float_or(config, "backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE)?;
    if !(0.0..1.0).contains(&value) {
        return Err(AlgotesterError::invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(value)
}

/// Build and validate the configured strategy. `name_override` replaces
/// `[strategy] name`; parameters not given keep their defaults.
pub fn strategy_from_config(
    config: &dyn ConfigPort,
    name_override: Option<&str>,
) -> Result<StrategyKind, AlgotesterError> {
    let name = name_override
        .map(str::to_string)
        .or_else(|| config.get_string("strategy", "name"))
        .unwrap_or_else(|| DEFAULT_STRATEGY.to_string());

    let strategy = match StrategyKind::default_for(&name)? {
        StrategyKind::MovingAverageCrossover { .. } => StrategyKind::MovingAverageCrossover {
            short_window: usize_or(config, "sma_short", sma::DEFAULT_SHORT)?,
            long_window: usize_or(config, "sma_long", sma::DEFAULT_LONG)?,
        },
        StrategyKind::Random { .. } => StrategyKind::Random {
            seed: seed_from_config(config)?,
        },
        StrategyKind::LaggedWeightedSum { weights } => StrategyKind::LaggedWeightedSum {
            weights: match config.get_string("strategy", "lag_weights") {
                Some(s) => parse_weights(&s)?,
                None => weights,
            },
        },
        StrategyKind::RsiThreshold { .. } => StrategyKind::RsiThreshold {
            window: usize_or(config, "rsi_window", rsi::DEFAULT_WINDOW)?,
            lower: float_or(config, "strategy", "rsi_lower", rsi::DEFAULT_LOWER)?,
            upper: float_or(config, "strategy", "rsi_upper", rsi::DEFAULT_UPPER)?,
        },
        StrategyKind::MacdCrossover { .. } => StrategyKind::MacdCrossover {
            fast: usize_or(config, "macd_fast", macd::DEFAULT_FAST)?,
            slow: usize_or(config, "macd_slow", macd::DEFAULT_SLOW)?,
            signal: usize_or(config, "macd_signal", macd::DEFAULT_SIGNAL)?,
        },
    };

    strategy.validate()?;
    Ok(strategy)
}

/// Comma-separated lag weights, most recent lag first.
pub fn parse_weights(input: &str) -> Result<Vec<f64>, AlgotesterError> {
    let weights = input
        .split(',')
        .map(|token| {
            token.trim().parse::<f64>().map_err(|_| {
                AlgotesterError::invalid(
                    "strategy",
                    "lag_weights",
                    format!("'{}' is not a number", token.trim()),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    lag::validate(&weights)?;
    Ok(weights)
}

fn parse_date(value: &str, key: &str) -> Result<NaiveDate, AlgotesterError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AlgotesterError::invalid(
            "backtest",
            key,
            format!("invalid {} format, expected YYYY-MM-DD", key),
        )
    })
}

fn seed_from_config(config: &dyn ConfigPort) -> Result<Option<u64>, AlgotesterError> {
    config
        .get_string("strategy", "seed")
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim().parse::<u64>().map_err(|_| {
                AlgotesterError::invalid("strategy", "seed", "seed must be a non-negative integer")
            })
        })
        .transpose()
}

fn usize_or(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, AlgotesterError> {
    match config.get_string("strategy", key) {
        Some(s) => s.trim().parse::<usize>().map_err(|_| {
            AlgotesterError::invalid(
                "strategy",
                key,
                format!("{} must be a non-negative integer", key),
            )
        }),
        None => Ok(default),
    }
}

fn float_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, AlgotesterError> {
    match config.get_string(section, key) {
        Some(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                AlgotesterError::invalid(section, key, format!("{} must be a number", key))
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestConfig {
        values: HashMap<(String, String), String>,
    }

    impl TestConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for TestConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn valid_backtest() -> TestConfig {
        TestConfig::new()
            .set("backtest", "symbols", "AAPL, MSFT")
            .set("backtest", "start_date", "2020-01-01")
            .set("backtest", "end_date", "2024-01-01")
    }

    fn assert_invalid(err: AlgotesterError, expected_key: &str) {
        match err {
            AlgotesterError::ConfigInvalid { key, .. } => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        assert!(validate_backtest_config(&valid_backtest(), today()).is_ok());
    }

    #[test]
    fn symbols_fall_back_to_symbol_key() {
        let config = TestConfig::new().set("backtest", "symbol", "spy");
        assert_eq!(symbols_from_config(&config).unwrap(), vec!["SPY"]);
    }

    #[test]
    fn missing_symbols_is_config_missing() {
        let config = TestConfig::new().set("backtest", "start_date", "2020-01-01");
        assert!(matches!(
            symbols_from_config(&config),
            Err(AlgotesterError::ConfigMissing { key, .. }) if key == "symbols"
        ));
    }

    #[test]
    fn duplicate_symbols_rejected() {
        let config = TestConfig::new().set("backtest", "symbols", "AAPL,aapl");
        assert_invalid(symbols_from_config(&config).unwrap_err(), "symbols");
    }

    #[test]
    fn explicit_dates_make_the_range() {
        let range = date_range_from_config(&valid_backtest(), today()).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn period_trails_from_today_without_end_date() {
        let config = TestConfig::new().set("backtest", "period", "5y");
        let range = date_range_from_config(&config, today()).unwrap();
        assert_eq!(range.end, today());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2019, 6, 30).unwrap());
    }

    #[test]
    fn start_date_wins_over_period() {
        let config = valid_backtest().set("backtest", "period", "1y");
        let range = date_range_from_config(&config, today()).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn missing_start_and_period() {
        let config = TestConfig::new().set("backtest", "end_date", "2024-01-01");
        assert!(matches!(
            date_range_from_config(&config, today()),
            Err(AlgotesterError::ConfigMissing { key, .. }) if key == "start_date"
        ));
    }

    #[test]
    fn bad_dates_rejected() {
        let config = valid_backtest().set("backtest", "start_date", "01/01/2020");
        assert_invalid(date_range_from_config(&config, today()).unwrap_err(), "start_date");

        let config = valid_backtest().set("backtest", "start_date", "2024-06-01");
        assert_invalid(date_range_from_config(&config, today()).unwrap_err(), "start_date");

        let config = TestConfig::new().set("backtest", "period", "5q");
        assert_invalid(date_range_from_config(&config, today()).unwrap_err(), "period");
    }

    #[test]
    fn interval_defaults_to_daily() {
        assert_eq!(interval_from_config(&TestConfig::new()).unwrap(), Interval::Day1);
        let config = TestConfig::new().set("backtest", "interval", "1wk");
        assert_eq!(interval_from_config(&config).unwrap(), Interval::Week1);
        let config = TestConfig::new().set("backtest", "interval", "7d");
        assert_invalid(interval_from_config(&config).unwrap_err(), "interval");
    }

    #[test]
    fn risk_free_rate_bounds() {
        assert_eq!(
            risk_free_rate_from_config(&TestConfig::new()).unwrap(),
            DEFAULT_RISK_FREE_RATE
        );
        let config = TestConfig::new().set("backtest", "risk_free_rate", "1.5");
        assert_invalid(risk_free_rate_from_config(&config).unwrap_err(), "risk_free_rate");
        let config = TestConfig::new().set("backtest", "risk_free_rate", "abc");
        assert_invalid(risk_free_rate_from_config(&config).unwrap_err(), "risk_free_rate");
    }

    #[test]
    fn strategy_defaults_to_sma() {
        let strategy = strategy_from_config(&TestConfig::new(), None).unwrap();
        assert_eq!(
            strategy,
            StrategyKind::MovingAverageCrossover {
                short_window: 40,
                long_window: 100
            }
        );
    }

    #[test]
    fn strategy_parameters_override_defaults() {
        let config = TestConfig::new()
            .set("strategy", "name", "macd")
            .set("strategy", "macd_fast", "5");
        assert_eq!(
            strategy_from_config(&config, None).unwrap(),
            StrategyKind::MacdCrossover {
                fast: 5,
                slow: 26,
                signal: 9
            }
        );
    }

    #[test]
    fn huge_window_is_config_invalid() {
        let config = TestConfig::new()
            .set("strategy", "name", "rsi")
            .set("strategy", "rsi_window", "18446744073709551615");
        assert_invalid(strategy_from_config(&config, None).unwrap_err(), "rsi_window");
    }

    #[test]
    fn name_override_replaces_configured_name() {
        let config = TestConfig::new()
            .set("strategy", "name", "sma")
            .set("strategy", "seed", "42");
        assert_eq!(
            strategy_from_config(&config, Some("random")).unwrap(),
            StrategyKind::Random { seed: Some(42) }
        );
    }

    #[test]
    fn unknown_strategy_name() {
        let config = TestConfig::new().set("strategy", "name", "momentum");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(AlgotesterError::UnknownStrategy { name }) if name == "momentum"
        ));
    }

    #[test]
    fn lag_weights_parse_and_validate() {
        assert_eq!(parse_weights("0.5, 0.3,0.2").unwrap(), vec![0.5, 0.3, 0.2]);
        assert_invalid(parse_weights("1, x").unwrap_err(), "lag_weights");
        assert_invalid(parse_weights("1, -1").unwrap_err(), "lag_weights");
    }

    #[test]
    fn invalid_strategy_parameters_rejected() {
        let config = TestConfig::new()
            .set("strategy", "name", "sma")
            .set("strategy", "sma_short", "-3");
        assert_invalid(validate_strategy_config(&config).unwrap_err(), "sma_short");

        let config = TestConfig::new()
            .set("strategy", "name", "random")
            .set("strategy", "seed", "abc");
        assert_invalid(validate_strategy_config(&config).unwrap_err(), "seed");
    }
}
