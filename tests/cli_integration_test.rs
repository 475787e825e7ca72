//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_backtest_config, settings builders)
//! - Symbol and strategy resolution with overrides
//! - Backtest and score commands over the simulated source
//! - CSV-backed runs with files on disk, results persisted across stacks
//! - Exit codes for bad configuration

mod common;

use common::*;
use std::fs;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;
use stratscope::adapters::file_config_adapter::FileConfigAdapter;
use stratscope::cli::{self, Cli, Command};
use stratscope::domain::data_manager::DataSource;
use stratscope::domain::error::StratscopeError;
use stratscope::domain::metrics::SharpeMode;
use stratscope::domain::scorer::ScoreFactor;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn same_code(a: ExitCode, b: ExitCode) -> bool {
    format!("{a:?}") == format!("{b:?}")
}

const SIMULATED_INI: &str = r#"
[backtest]
start_date = 2022-01-01
end_date = 2023-12-31
initial_capital = 25000
symbols = AAPL, MSFT
strategies = Momentum, Mean Reversion, My Custom
sharpe_mode = holding_period
close_open_position = yes

[data]
source = simulated
fetch_timeout_secs = 3

[scoring]
parallel = false
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_reads_all_fields() {
        let adapter = FileConfigAdapter::from_string(SIMULATED_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_eq!(config.start_date, date(2022, 1, 1));
        assert_eq!(config.end_date, date(2023, 12, 31));
        assert_eq!(config.initial_capital, 25_000.0);
        assert_eq!(config.sharpe_mode, SharpeMode::AverageHoldingPeriod);
        assert!(config.close_open_position);
        assert_eq!(config.min_bars, 30);
    }

    #[test]
    fn build_backtest_config_missing_start_date() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nend_date = 2024-12-31\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, StratscopeError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn build_backtest_config_invalid_date_format() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\nstart_date = 2020/01/01\nend_date = 2024-12-31\n",
        )
        .unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, StratscopeError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn data_settings_from_config() {
        let adapter = FileConfigAdapter::from_string(SIMULATED_INI).unwrap();
        let settings = cli::build_data_settings(&adapter);
        assert_eq!(settings.fetch_timeout, Duration::from_secs(3));
        assert_eq!(settings.price_cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn scorer_settings_reject_bad_weight_sum() {
        let adapter = FileConfigAdapter::from_string("[scoring]\nnews_sentiment = 0.9\n").unwrap();
        let err = cli::build_scorer_settings(&adapter).err().unwrap();
        assert!(matches!(err, StratscopeError::ConfigInvalid { .. }));
    }
}

mod resolution {
    use super::*;

    #[test]
    fn configured_lists() {
        let adapter = FileConfigAdapter::from_string(SIMULATED_INI).unwrap();
        assert_eq!(cli::resolve_symbols(None, &adapter).unwrap(), vec!["AAPL", "MSFT"]);
        assert_eq!(
            cli::resolve_strategies(None, &adapter).unwrap(),
            vec!["Momentum", "Mean Reversion", "My Custom"]
        );
    }

    #[test]
    fn singular_key_fallback() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\nsymbol = spy\nstrategy = Breakout\n",
        )
        .unwrap();
        assert_eq!(cli::resolve_symbols(None, &adapter).unwrap(), vec!["SPY"]);
        assert_eq!(cli::resolve_strategies(None, &adapter).unwrap(), vec!["Breakout"]);
    }

    #[test]
    fn override_with_duplicate_is_invalid() {
        let adapter = FileConfigAdapter::from_string(SIMULATED_INI).unwrap();
        let err = cli::resolve_symbols(Some("AAPL,aapl"), &adapter).unwrap_err();
        assert!(matches!(err, StratscopeError::ConfigInvalid { key, .. } if key == "symbols"));
    }

    #[test]
    fn missing_lists_are_reported() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert!(matches!(
            cli::resolve_strategies(None, &adapter),
            Err(StratscopeError::ConfigMissing { .. })
        ));
    }
}

mod simulated_runs {
    use super::*;

    #[test]
    fn backtests_every_pair() {
        let adapter = FileConfigAdapter::from_string(SIMULATED_INI).unwrap();
        let symbols = cli::resolve_symbols(None, &adapter).unwrap();
        let strategies = cli::resolve_strategies(None, &adapter).unwrap();
        let stack = cli::build_data_stack(&adapter, &symbols).unwrap();

        let runs = cli::execute_backtests(&adapter, &stack, &symbols, &strategies).unwrap();

        assert_eq!(runs.len(), 6);
        assert_eq!(runs[0].symbol, "AAPL");
        assert_eq!(runs[0].strategy, "Momentum");
        assert_eq!(runs[5].symbol, "MSFT");
        assert_eq!(runs[5].strategy, "My Custom");
        for run in &runs {
            assert!(run.bars_used > 400);
            if let Some(perf) = &run.performance {
                let stored = stack.store.latest_result(&run.symbol, &run.strategy).unwrap();
                assert_eq!(stored, Some(perf.summary()));
            }
        }
    }

    #[test]
    fn simulated_source_is_deterministic() {
        let adapter = FileConfigAdapter::from_string(SIMULATED_INI).unwrap();
        let symbols = vec!["AAPL".to_string()];
        let strategies = vec!["Momentum".to_string()];

        let first = cli::execute_backtests(
            &adapter,
            &cli::build_data_stack(&adapter, &symbols).unwrap(),
            &symbols,
            &strategies,
        )
        .unwrap();
        let second = cli::execute_backtests(
            &adapter,
            &cli::build_data_stack(&adapter, &symbols).unwrap(),
            &symbols,
            &strategies,
        )
        .unwrap();
        assert_eq!(first[0].trades, second[0].trades);
    }

    #[test]
    fn ranks_every_pair_in_score_order() {
        let adapter = FileConfigAdapter::from_string(SIMULATED_INI).unwrap();
        let symbols = cli::resolve_symbols(None, &adapter).unwrap();
        let strategies = cli::resolve_strategies(None, &adapter).unwrap();
        let stack = cli::build_data_stack(&adapter, &symbols).unwrap();

        let ranked = cli::rank_configured_pairs(&adapter, &stack, &symbols, &strategies).unwrap();

        assert_eq!(ranked.len(), 6);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        for pair in &ranked {
            // No news source and no stored backtests.
            assert_eq!(pair.components.get(ScoreFactor::NewsVolume), 0.0);
            assert_eq!(pair.components.get(ScoreFactor::PrevBacktest), 0.5);
        }
    }

    #[test]
    fn stored_backtests_feed_the_scorer() {
        let adapter = FileConfigAdapter::from_string(SIMULATED_INI).unwrap();
        let symbols = cli::resolve_symbols(None, &adapter).unwrap();
        let strategies = vec!["Momentum".to_string()];
        let stack = cli::build_data_stack(&adapter, &symbols).unwrap();

        let runs = cli::execute_backtests(&adapter, &stack, &symbols, &strategies).unwrap();
        let ranked = cli::rank_configured_pairs(&adapter, &stack, &symbols, &strategies).unwrap();

        assert!(runs.iter().any(|r| r.performance.is_some()));
        for pair in &ranked {
            let run = runs.iter().find(|r| r.symbol == pair.symbol).unwrap();
            if run.performance.is_some() {
                assert_ne!(pair.components.get(ScoreFactor::PrevBacktest), 0.5);
            } else {
                assert_eq!(pair.components.get(ScoreFactor::PrevBacktest), 0.5);
            }
        }
    }
}

mod csv_runs {
    use super::*;

    fn write_prices(dir: &std::path::Path, symbol: &str) {
        let mut content = String::from("date,open,high,low,close,volume\n");
        let start = date(2024, 1, 1);
        for (i, close) in rise_then_fall_closes().iter().enumerate() {
            let day = start + chrono::Duration::days(i as i64);
            content.push_str(&format!("{day},{close},{},{},{close},1000\n", close + 1.0, close - 1.0));
        }
        fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
    }

    #[test]
    fn csv_backtest_writes_reports() {
        let data = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        write_prices(data.path(), "AAPL");

        let ini = format!(
            "[backtest]\nstart_date = 2024-01-01\nend_date = 2024-12-31\n\
             symbols = AAPL\nstrategies = Momentum\n\
             [data]\nsource = csv\ncsv_dir = {}\nfallback_to_simulated = false\n",
            data.path().display()
        );
        let file = write_temp_ini(&ini);

        let code = cli::run(Cli {
            command: Command::Backtest {
                config: file.path().to_path_buf(),
                symbol: None,
                strategy: None,
                output: Some(out.path().to_path_buf()),
            },
        });

        assert!(same_code(code, ExitCode::SUCCESS));
        assert!(out.path().join("AAPL_Momentum_trades.csv").exists());
        assert!(out.path().join("AAPL_Momentum_equity.csv").exists());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn csv_backtest_results_reach_a_later_score() {
        let data = tempfile::TempDir::new().unwrap();
        let db = tempfile::TempDir::new().unwrap();
        write_prices(data.path(), "AAPL");

        let ini = format!(
            "[backtest]\nstart_date = 2024-01-01\nend_date = 2024-12-31\n\
             symbols = AAPL\nstrategies = Momentum\n\
             [data]\nsource = csv\ncsv_dir = {}\nfallback_to_simulated = false\n\
             [sqlite]\npath = {}\n",
            data.path().display(),
            db.path().join("results.db").display()
        );
        let file = write_temp_ini(&ini);

        let code = cli::run(Cli {
            command: Command::Backtest {
                config: file.path().to_path_buf(),
                symbol: None,
                strategy: None,
                output: None,
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));

        // A fresh stack stands in for a second process.
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let symbols = cli::resolve_symbols(None, &adapter).unwrap();
        let strategies = cli::resolve_strategies(None, &adapter).unwrap();
        let stack = cli::build_data_stack(&adapter, &symbols).unwrap();

        let stored = stack.store.latest_result("AAPL", "Momentum").unwrap().unwrap();
        assert_eq!(stored.total_trades, 1);

        let ranked = cli::rank_configured_pairs(&adapter, &stack, &symbols, &strategies).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_ne!(ranked[0].components.get(ScoreFactor::PrevBacktest), 0.5);
    }

    #[test]
    fn csv_without_sqlite_path_keeps_results_in_memory() {
        let data = tempfile::TempDir::new().unwrap();
        write_prices(data.path(), "AAPL");
        let ini = format!(
            "[backtest]\nstart_date = 2024-01-01\nend_date = 2024-12-31\n\
             symbols = AAPL\nstrategies = Momentum\n\
             [data]\nsource = csv\ncsv_dir = {}\n",
            data.path().display()
        );
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let symbols = cli::resolve_symbols(None, &adapter).unwrap();
        let strategies = cli::resolve_strategies(None, &adapter).unwrap();

        let first = cli::build_data_stack(&adapter, &symbols).unwrap();
        cli::execute_backtests(&adapter, &first, &symbols, &strategies).unwrap();
        assert!(first.store.latest_result("AAPL", "Momentum").unwrap().is_some());

        let second = cli::build_data_stack(&adapter, &symbols).unwrap();
        assert!(second.store.latest_result("AAPL", "Momentum").unwrap().is_none());
    }

    #[test]
    fn missing_csv_symbol_falls_back_to_simulated() {
        let data = tempfile::TempDir::new().unwrap();
        let ini = format!(
            "[backtest]\nstart_date = 2023-01-01\nend_date = 2023-12-31\n\
             symbols = ZZZ\nstrategies = Momentum\n\
             [data]\nsource = csv\ncsv_dir = {}\n",
            data.path().display()
        );
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let symbols = cli::resolve_symbols(None, &adapter).unwrap();
        let stack = cli::build_data_stack(&adapter, &symbols).unwrap();

        let fetch = stack
            .manager
            .fetch_prices("ZZZ", date(2023, 1, 1), date(2023, 12, 31))
            .unwrap();
        assert_eq!(fetch.source, DataSource::Simulated);
    }
}

mod exit_codes {
    use super::*;

    #[test]
    fn missing_config_file_is_config_error() {
        let code = cli::run(Cli {
            command: Command::Validate {
                config: "/nonexistent/stratscope.ini".into(),
            },
        });
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn valid_config_validates() {
        let file = write_temp_ini(SIMULATED_INI);
        let code = cli::run(Cli {
            command: Command::Validate {
                config: file.path().to_path_buf(),
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn unknown_source_is_config_error() {
        let file = write_temp_ini(&SIMULATED_INI.replace("source = simulated", "source = ftp"));
        let code = cli::run(Cli {
            command: Command::Validate {
                config: file.path().to_path_buf(),
            },
        });
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn csv_without_data_is_data_error() {
        let data = tempfile::TempDir::new().unwrap();
        let ini = format!(
            "[backtest]\nstart_date = 2023-01-01\nend_date = 2023-12-31\n\
             symbols = ZZZ\nstrategies = Momentum\n\
             [data]\nsource = csv\ncsv_dir = {}\nfallback_to_simulated = off\n",
            data.path().display()
        );
        let file = write_temp_ini(&ini);
        let code = cli::run(Cli {
            command: Command::Backtest {
                config: file.path().to_path_buf(),
                symbol: None,
                strategy: None,
                output: None,
            },
        });
        assert!(same_code(code, ExitCode::from(5)));
    }

    #[test]
    fn strategies_command_succeeds() {
        assert!(same_code(
            cli::run(Cli { command: Command::Strategies }),
            ExitCode::SUCCESS
        ));
    }
}
