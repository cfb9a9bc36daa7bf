//! End-to-end tests of the return → position → statistics pipeline.

mod common;

use algotester::cli::run_backtest_pipeline;
use algotester::domain::backtest::run_backtest;
use algotester::domain::combiner::{self, COMBINED_LABEL};
use algotester::domain::error::AlgotesterError;
use algotester::domain::metrics::{PerformanceStats, cumulative_curve};
use algotester::domain::returns::log_returns;
use algotester::domain::series::Series;
use algotester::domain::strategy::{LONG, SHORT, StrategyKind, generate_positions};
use algotester::domain::universe::SkipReason;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use common::*;

mod scenarios {
    use super::*;

    #[test]
    fn four_prices_returns_and_cumulative_curve() {
        let inst = instrument(
            "X",
            bars_from_closes("2024-01-01", &[100.0, 102.0, 101.0, 105.0]),
        );
        let returns = log_returns(&inst).unwrap();
        let r = returns.values();

        assert_eq!(r.len(), 3);
        assert_abs_diff_eq!(r[0], 0.0198, epsilon = 5e-4);
        assert_abs_diff_eq!(r[1], -0.0098, epsilon = 5e-4);
        assert_abs_diff_eq!(r[2], 0.0390, epsilon = 5e-4);

        let curve = cumulative_curve(&returns).values();
        assert_abs_diff_eq!(curve[0], 1.0198, epsilon = 1e-3);
        assert_abs_diff_eq!(curve[1], 1.0098, epsilon = 1e-3);
        assert_abs_diff_eq!(curve[2], 1.0498, epsilon = 2e-3);
    }

    #[test]
    fn constant_long_position_reproduces_returns() {
        let inst = instrument(
            "X",
            bars_from_closes("2024-01-01", &[100.0, 102.0, 101.0, 105.0]),
        );
        let returns = log_returns(&inst).unwrap();
        let positions = returns.map_values(|_| LONG);

        let strategy_returns = combiner::strategy_returns("X", &returns, &positions).unwrap();
        assert_eq!(strategy_returns, returns);
    }

    #[test]
    fn two_instruments_combine_by_sum() {
        let stamps: Vec<_> = bars_from_closes("2024-01-01", &[1.0, 1.0])
            .iter()
            .map(|b| b.timestamp)
            .collect();
        let a = Series::from_parts(&stamps, &[0.01, -0.02]);
        let b = Series::from_parts(&stamps, &[0.00, 0.01]);

        let combined = combiner::combine([("A", Some(&a)), ("B", Some(&b))]).unwrap();
        let values = combined.values();
        assert_relative_eq!(values[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(values[1], -0.01, epsilon = 1e-12);
    }

    #[test]
    fn missing_strategy_leg_is_reported() {
        let a = Series::from_parts(&[], &[]);
        let err = combiner::combine([("A", Some(&a)), ("B", None)]).unwrap_err();
        assert!(matches!(err, AlgotesterError::NoStrategyColumn { symbol } if symbol == "B"));
    }
}

mod strategies {
    use super::*;

    fn run_default(name: &str, bars: usize) -> algotester::domain::backtest::InstrumentResult {
        let inst = instrument("X", generate_bars("2024-01-01", bars, 100.0));
        let config = sample_config(&["X"], StrategyKind::default_for(name).unwrap());
        let mut report = run_backtest(&[inst], &config).unwrap();
        report.instruments.remove(0)
    }

    #[test]
    fn every_default_strategy_runs_on_two_hundred_bars() {
        for name in ["sma", "random", "lag", "rsi", "macd"] {
            let result = run_default(name, 200);
            let strategy = StrategyKind::default_for(name).unwrap();

            assert_eq!(result.positions.len(), 200 - 1 - strategy.lookback(), "{name}");
            assert!(result.returns.is_aligned_with(&result.positions), "{name}");
            assert!(
                result
                    .positions
                    .values()
                    .iter()
                    .all(|p| [LONG, SHORT, 0.0].contains(p)),
                "{name}"
            );
        }
    }

    #[test]
    fn sma_positions_are_long_or_short_after_warm_up() {
        let result = run_default("sma", 150);
        assert_eq!(result.positions.len(), 150 - 100);
        assert!(
            result
                .positions
                .values()
                .iter()
                .all(|&p| p == LONG || p == SHORT)
        );
    }

    #[test]
    fn uptrend_keeps_sma_long() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let inst = instrument("UP", bars_from_closes("2024-01-01", &closes));
        let strategy = StrategyKind::MovingAverageCrossover {
            short_window: 5,
            long_window: 20,
        };
        let returns = log_returns(&inst).unwrap();
        let positions = generate_positions(&strategy, &inst, &returns, 0).unwrap();

        assert!(positions.values().iter().all(|&p| p == LONG));
        // first position trades the return realised at bar 20
        assert_eq!(positions.first_timestamp(), Some(inst.bars[20].timestamp));
    }

    #[test]
    fn short_history_is_insufficient() {
        let inst = instrument("X", generate_bars("2024-01-01", 30, 100.0));
        let strategy = StrategyKind::default_for("macd").unwrap();
        let returns = log_returns(&inst).unwrap();

        let err = generate_positions(&strategy, &inst, &returns, 0).unwrap_err();
        assert!(matches!(
            err,
            AlgotesterError::InsufficientData { bars: 30, minimum: 35, .. }
        ));
    }
}

mod combined {
    use super::*;

    #[test]
    fn combined_uses_timestamps_common_to_all_instruments() {
        let a = instrument("A", generate_bars("2024-01-01", 40, 100.0));
        let b = instrument("B", generate_bars("2024-01-06", 40, 50.0));
        let config = sample_config(
            &["A", "B"],
            StrategyKind::MovingAverageCrossover {
                short_window: 3,
                long_window: 8,
            },
        );

        let report = run_backtest(&[a, b], &config).unwrap();
        let ra = report.instruments[0].strategy_returns.value_index();
        let rb = report.instruments[1].strategy_returns.value_index();

        assert!(!report.combined.strategy_returns.is_empty());
        for point in &report.combined.strategy_returns.points {
            let expected = ra[&point.timestamp] + rb[&point.timestamp];
            assert_relative_eq!(point.value, expected, epsilon = 1e-12);
        }
        // A starts five days earlier and B ends five days later
        assert_eq!(
            report.combined.strategy_returns.len(),
            report.instruments[0].strategy_returns.len() - 5
        );
    }

    #[test]
    fn stats_are_reported_for_every_symbol_and_combined() {
        let config = sample_config(&["A", "B"], StrategyKind::Random { seed: Some(11) });
        let report = run_backtest(
            &[
                instrument("A", generate_bars("2024-01-01", 50, 100.0)),
                instrument("B", generate_bars("2024-01-01", 50, 20.0)),
            ],
            &config,
        )
        .unwrap();

        let labels: Vec<&str> = report.strategy_stats().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["A", "B", COMBINED_LABEL]);
        for (_, stats) in report.strategy_stats() {
            assert!(stats.max_drawdown <= 0.0 && stats.max_drawdown >= -1.0);
            assert!(stats.average_drawdown >= stats.max_drawdown);
        }
    }

    #[test]
    fn flat_prices_yield_degenerate_sharpe_not_a_crash() {
        let config = sample_config(&["F"], StrategyKind::default_for("lag").unwrap());
        let report = run_backtest(
            &[instrument("F", bars_from_closes("2024-01-01", &[10.0; 20]))],
            &config,
        )
        .unwrap();

        let stats: &PerformanceStats = &report.instruments[0].strategy;
        assert_eq!(stats.sharpe_ratio, None);
        assert_eq!(stats.sharpe_display(), "NaN");
        assert_eq!(report.combined.strategy.sharpe_ratio, None);
    }
}

mod universe {
    use super::*;

    #[test]
    fn missing_and_failing_symbols_are_skipped() {
        let store = MockPriceStore::new()
            .with_bars("GOOD", generate_bars("2024-01-01", 60, 100.0))
            .with_bars("EMPTY", vec![])
            .with_error("BROKEN", "connection reset");
        let config = sample_config(
            &["GOOD", "MISSING", "EMPTY", "BROKEN"],
            StrategyKind::default_for("rsi").unwrap(),
        );

        let report = run_backtest_pipeline(&store, &config).unwrap();

        assert_eq!(report.instruments.len(), 1);
        assert_eq!(report.instruments[0].symbol, "GOOD");
        assert_eq!(
            report.combined.strategy_returns,
            report.instruments[0].strategy_returns
        );

        let skipped: Vec<(&str, &SkipReason)> = report
            .skipped
            .iter()
            .map(|s| (s.symbol.as_str(), &s.reason))
            .collect();
        assert_eq!(skipped.len(), 3);
        assert_eq!(skipped[0], ("MISSING", &SkipReason::NoData));
        assert_eq!(skipped[1], ("EMPTY", &SkipReason::NoData));
        assert!(matches!(skipped[2], ("BROKEN", SkipReason::Failed(reason)) if reason.contains("connection reset")));
    }

    #[test]
    fn fetch_is_limited_to_the_date_range() {
        let store = MockPriceStore::new().with_bars("A", generate_bars("2023-12-01", 120, 100.0));
        let config = sample_config(&["A"], StrategyKind::Random { seed: Some(1) });

        let report = run_backtest_pipeline(&store, &config).unwrap();
        let first = report.instruments[0].returns.first_timestamp().unwrap();
        assert!(first.date() > date(2024, 1, 1));
    }

    #[test]
    fn no_symbol_with_data_is_no_data() {
        let store = MockPriceStore::new().with_bars("EMPTY", vec![]);
        let config = sample_config(&["EMPTY", "MISSING"], StrategyKind::Random { seed: None });

        let err = run_backtest_pipeline(&store, &config).unwrap_err();
        assert!(matches!(err, AlgotesterError::NoData { .. }));
    }

    #[test]
    fn short_symbol_is_skipped_after_fetch() {
        let store = MockPriceStore::new()
            .with_bars("LONG", generate_bars("2024-01-01", 150, 100.0))
            .with_bars("SHORT", generate_bars("2024-01-01", 50, 100.0));
        let config = sample_config(&["LONG", "SHORT"], StrategyKind::default_for("sma").unwrap());

        let report = run_backtest_pipeline(&store, &config).unwrap();
        assert_eq!(report.instruments.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::InsufficientData {
                bars: 50,
                minimum: 101
            }
        );
    }
}
