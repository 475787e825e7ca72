//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_store::MemoryBacktestStore;
use crate::adapters::simulated_adapter::SimulatedAdapter;
use crate::domain::backtest::{
    BacktestConfig, BacktestRequest, BacktestRun, DEFAULT_MIN_BARS, run_batch,
};
use crate::domain::cache::{Clock, SystemClock};
use crate::domain::config_validation::{
    data_source, parse_date, score_weights, sharpe_mode, strategy_list, symbol_list,
    validate_all, validate_backtest_config, validate_data_config,
};
use crate::domain::data_manager::{DataManager, DataSettings};
use crate::domain::error::StratscopeError;
use crate::domain::indicator_helpers::warmup_bars;
use crate::domain::scorer::{RankedPair, ScoreFactor, ScorerSettings, ScoringRequest, SymbolScorer};
use crate::domain::strategy::{CATALOG, StrategyKind};
use crate::domain::universe::{UniverseError, load_universe, parse_strategies, parse_symbols};
use crate::ports::backtest_store_port::BacktestStorePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::news_port::NewsPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stratscope", about = "Strategy backtester and symbol/strategy scorer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest every configured (symbol, strategy) pair
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Run only this symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Run only this strategy
        #[arg(long)]
        strategy: Option<String>,
        /// Directory for CSV trade and equity reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rank configured pairs by composite score
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        top: Option<usize>,
    },
    /// List the strategy catalog
    Strategies,
    /// Validate a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show stored data ranges
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            symbol,
            strategy,
            output,
        } => run_backtest(&config, symbol.as_deref(), strategy.as_deref(), output.as_deref()),
        Command::Score { config, top } => run_score(&config, top),
        Command::Strategies => {
            print_strategies();
            Ok(())
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StratscopeError> {
    log::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StratscopeError> {
    let start_date = parse_date(
        config.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        config.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: config.get_double("backtest", "initial_capital", 10_000.0),
        min_bars: config
            .get_int("backtest", "min_bars", DEFAULT_MIN_BARS as i64)
            .max(1) as usize,
        close_open_position: config.get_bool("backtest", "close_open_position", false),
        sharpe_mode: sharpe_mode(config)?,
    })
}

fn secs(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Duration {
    Duration::from_secs(config.get_int(section, key, default).max(0) as u64)
}

pub fn build_data_settings(config: &dyn ConfigPort) -> DataSettings {
    DataSettings {
        fetch_timeout: secs(config, "data", "fetch_timeout_secs", 10),
        price_cache_ttl: secs(config, "data", "price_cache_ttl_secs", 3600),
        news_cache_ttl: secs(config, "data", "news_cache_ttl_secs", 3600),
    }
}

pub fn build_scorer_settings(config: &dyn ConfigPort) -> Result<ScorerSettings, StratscopeError> {
    Ok(ScorerSettings {
        weights: score_weights(config)?,
        subscore_ttl: secs(config, "scoring", "subscore_ttl_secs", 14_400),
        news_subscore_ttl: secs(config, "scoring", "news_subscore_ttl_secs", 3_600),
    })
}

fn list_error(key: &str, e: UniverseError) -> StratscopeError {
    StratscopeError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: e.to_string(),
    }
}

/// Symbols from the override when given, else from `[backtest]`.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, StratscopeError> {
    let raw = match symbol_override {
        Some(s) => s.to_string(),
        None => symbol_list(config).ok_or_else(|| StratscopeError::ConfigMissing {
            section: "backtest".into(),
            key: "symbols".into(),
        })?,
    };
    parse_symbols(&raw).map_err(|e| list_error("symbols", e))
}

pub fn resolve_strategies(
    strategy_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, StratscopeError> {
    let raw = match strategy_override {
        Some(s) => s.to_string(),
        None => strategy_list(config).ok_or_else(|| StratscopeError::ConfigMissing {
            section: "backtest".into(),
            key: "strategies".into(),
        })?,
    };
    parse_strategies(&raw).map_err(|e| list_error("strategies", e))
}

/// Data access and result persistence wired from `[data]`.
pub struct DataStack {
    pub manager: DataManager,
    pub store: Arc<dyn BacktestStorePort>,
}

pub fn build_data_stack(
    config: &dyn ConfigPort,
    symbols: &[String],
) -> Result<DataStack, StratscopeError> {
    let settings = build_data_settings(config);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let source = data_source(config);

    let mut store: Arc<dyn BacktestStorePort> = Arc::new(MemoryBacktestStore::new());
    let news_dir = config
        .get_string("data", "news_dir")
        .filter(|s| !s.trim().is_empty());

    let (prices, mut news): (Arc<dyn PriceDataPort>, Option<Arc<dyn NewsPort>>) =
        match source.as_str() {
            "csv" => {
                let csv_dir = config.get_string("data", "csv_dir").ok_or_else(|| {
                    StratscopeError::ConfigMissing {
                        section: "data".into(),
                        key: "csv_dir".into(),
                    }
                })?;
                let mut adapter = CsvAdapter::new(PathBuf::from(csv_dir));
                if let Some(dir) = &news_dir {
                    adapter = adapter.with_news_dir(PathBuf::from(dir));
                }
                let adapter = Arc::new(adapter);
                let news: Arc<dyn NewsPort> = adapter.clone();
                (adapter, Some(news))
            }
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let adapter = Arc::new(crate::adapters::sqlite_adapter::SqliteAdapter::from_config(
                    config,
                )?);
                store = adapter.clone();
                let prices: Arc<dyn PriceDataPort> = adapter;
                (prices, None)
            }
            #[cfg(not(feature = "sqlite"))]
            "sqlite" => {
                return Err(StratscopeError::ConfigInvalid {
                    section: "data".into(),
                    key: "source".into(),
                    reason: "built without the sqlite feature".into(),
                });
            }
            "simulated" => {
                let prices: Arc<dyn PriceDataPort> =
                    Arc::new(SimulatedAdapter::new(symbols.to_vec()));
                (prices, None)
            }
            other => {
                return Err(StratscopeError::ConfigInvalid {
                    section: "data".into(),
                    key: "source".into(),
                    reason: format!("unknown source '{other}'"),
                });
            }
        };

    if news.is_none() {
        if let Some(dir) = &news_dir {
            news = Some(Arc::new(CsvAdapter::new(PathBuf::from(dir))));
        }
    }

    if source != "sqlite" {
        if let Some(path) = config.get_string("sqlite", "path").filter(|p| !p.trim().is_empty()) {
            store = results_store(config, &path)?;
        }
    }

    let mut manager = DataManager::new(prices, settings, clock);
    if let Some(news) = news {
        manager = manager.with_news(news);
    }
    if source != "simulated" && config.get_bool("data", "fallback_to_simulated", true) {
        manager = manager.with_fallback(Arc::new(SimulatedAdapter::new(symbols.to_vec())));
    }

    log::debug!(
        "data source {source}, fallback {}",
        if manager.has_fallback() { "on" } else { "off" }
    );
    Ok(DataStack { manager, store })
}

/// Backtest summaries go to `[sqlite] path` even when prices come from elsewhere.
#[cfg(feature = "sqlite")]
fn results_store(
    config: &dyn ConfigPort,
    path: &str,
) -> Result<Arc<dyn BacktestStorePort>, StratscopeError> {
    log::debug!("storing backtest results in {path}");
    Ok(Arc::new(
        crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?,
    ))
}

#[cfg(not(feature = "sqlite"))]
fn results_store(
    _config: &dyn ConfigPort,
    path: &str,
) -> Result<Arc<dyn BacktestStorePort>, StratscopeError> {
    log::warn!("built without the sqlite feature; results for {path} stay in memory");
    Ok(Arc::new(MemoryBacktestStore::new()))
}

/// Loads the universe and backtests every (symbol, strategy) pair.
pub fn execute_backtests(
    config: &dyn ConfigPort,
    stack: &DataStack,
    symbols: &[String],
    strategies: &[String],
) -> Result<Vec<BacktestRun>, StratscopeError> {
    let bt_config = build_backtest_config(config)?;
    let universe = load_universe(
        &stack.manager,
        symbols,
        bt_config.start_date,
        bt_config.end_date,
        bt_config.min_bars,
    )?;
    if universe.simulated_count() > 0 {
        log::warn!(
            "{} symbol(s) are using simulated data",
            universe.simulated_count()
        );
    }

    let requests: Vec<BacktestRequest> = universe
        .symbols
        .iter()
        .flat_map(|loaded| {
            strategies.iter().map(move |strategy| BacktestRequest {
                symbol: loaded.symbol.clone(),
                strategy: strategy.clone(),
                bars: loaded.fetch.bars.clone(),
            })
        })
        .collect();

    let parallel = config.get_bool("scoring", "parallel", true);
    let runs = run_batch(&requests, &bt_config, parallel);

    for run in &runs {
        if let Some(performance) = &run.performance {
            if let Err(e) = stack
                .store
                .save_result(&run.symbol, &run.strategy, &performance.summary())
            {
                log::warn!("could not store result for {}/{}: {e}", run.symbol, run.strategy);
            }
        }
    }
    Ok(runs)
}

/// Scores every configured pair, using the latest stored backtest summary
/// for each pair when one exists.
pub fn rank_configured_pairs(
    config: &dyn ConfigPort,
    stack: &DataStack,
    symbols: &[String],
    strategies: &[String],
) -> Result<Vec<RankedPair>, StratscopeError> {
    let bt_config = build_backtest_config(config)?;
    let (start, end) = (bt_config.start_date, bt_config.end_date);
    let universe = load_universe(&stack.manager, symbols, start, end, bt_config.min_bars)?;

    let benchmark = config
        .get_string("scoring", "sector_benchmark")
        .filter(|s| !s.trim().is_empty())
        .and_then(|symbol| match stack.manager.fetch_prices(symbol.trim(), start, end) {
            Ok(fetch) => Some(fetch.bars),
            Err(e) => {
                log::warn!("benchmark {symbol} unavailable ({e}); sector score neutral");
                None
            }
        });

    let mut requests = Vec::new();
    for loaded in &universe.symbols {
        let news = stack.manager.fetch_news(&loaded.symbol, start, end);
        for strategy in strategies {
            let prior = stack
                .store
                .latest_result(&loaded.symbol, strategy)
                .unwrap_or_else(|e| {
                    log::warn!("no prior result for {}/{strategy}: {e}", loaded.symbol);
                    None
                });
            requests.push(ScoringRequest {
                symbol: loaded.symbol.clone(),
                strategy: strategy.clone(),
                bars: loaded.fetch.bars.clone(),
                news: news.clone(),
                prior,
            });
        }
    }

    let scorer = SymbolScorer::new(build_scorer_settings(config)?, Arc::new(SystemClock));
    let parallel = config.get_bool("scoring", "parallel", true);
    Ok(scorer.rank_pairs(&requests, benchmark.as_deref(), parallel))
}

pub fn format_run_row(run: &BacktestRun) -> String {
    match &run.performance {
        Some(p) => format!(
            "{:<8} {:<18} {:>6} {:>7.1}% {:>7.2} {:>7.2} {:>8.1}% {:>8.2}%",
            run.symbol,
            run.strategy,
            p.total_trades,
            p.win_rate_pct,
            p.sharpe,
            p.profit_factor,
            p.max_drawdown_pct,
            p.total_return_pct,
        ),
        None => format!(
            "{:<8} {:<18} {:>6}  no closed trades ({} bars)",
            run.symbol, run.strategy, 0, run.bars_used
        ),
    }
}

fn factor_label(factor: ScoreFactor) -> &'static str {
    match factor {
        ScoreFactor::NewsSentiment => "Sent",
        ScoreFactor::NewsVolume => "NVol",
        ScoreFactor::PriceMomentum => "Mom",
        ScoreFactor::VolumeAnomaly => "VolA",
        ScoreFactor::SectorRelative => "Sect",
        ScoreFactor::VolatilityRegime => "Regm",
        ScoreFactor::PrevBacktest => "Prev",
    }
}

pub fn format_ranked_row(rank: usize, pair: &RankedPair) -> String {
    let components: Vec<String> = pair
        .components
        .iter()
        .map(|(_, value)| format!("{value:>5.2}"))
        .collect();
    format!(
        "{:>3} {:<8} {:<18} {:>6.3} {}",
        rank,
        pair.symbol,
        pair.strategy,
        pair.score,
        components.join(" ")
    )
}

fn run_backtest(
    config_path: &Path,
    symbol: Option<&str>,
    strategy: Option<&str>,
    output: Option<&Path>,
) -> Result<(), StratscopeError> {
    let config = load_config(config_path)?;
    validate_backtest_config(&config)?;
    validate_data_config(&config)?;

    let symbols = resolve_symbols(symbol, &config)?;
    let strategies = resolve_strategies(strategy, &config)?;
    let stack = build_data_stack(&config, &symbols)?;

    let runs = execute_backtests(&config, &stack, &symbols, &strategies)?;

    println!(
        "{:<8} {:<18} {:>6} {:>8} {:>7} {:>7} {:>9} {:>9}",
        "Symbol", "Strategy", "Trades", "WinRate", "Sharpe", "PF", "MaxDD", "Return"
    );
    for run in &runs {
        println!("{}", format_run_row(run));
    }

    let output_dir = output
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output_dir").map(PathBuf::from));
    if let Some(dir) = output_dir {
        let written = CsvReportAdapter.write_runs(&runs, &dir)?;
        log::info!("wrote {} report file(s) to {}", written.len(), dir.display());
    }
    Ok(())
}

fn run_score(config_path: &Path, top: Option<usize>) -> Result<(), StratscopeError> {
    let config = load_config(config_path)?;
    validate_all(&config)?;

    let symbols = resolve_symbols(None, &config)?;
    let strategies = resolve_strategies(None, &config)?;
    let stack = build_data_stack(&config, &symbols)?;

    let ranked = rank_configured_pairs(&config, &stack, &symbols, &strategies)?;
    let shown = top.unwrap_or(ranked.len()).min(ranked.len());

    let labels: Vec<String> = ScoreFactor::ALL
        .iter()
        .map(|f| format!("{:>5}", factor_label(*f)))
        .collect();
    println!(
        "{:>3} {:<8} {:<18} {:>6} {}",
        "#",
        "Symbol",
        "Strategy",
        "Score",
        labels.join(" ")
    );
    for (i, pair) in ranked.iter().take(shown).enumerate() {
        println!("{}", format_ranked_row(i + 1, pair));
    }
    Ok(())
}

fn print_strategies() {
    for (name, kind) in CATALOG {
        let indicators: Vec<String> = kind
            .required_indicators()
            .iter()
            .map(|id| id.to_string())
            .collect();
        let alias = if *name != kind.name() {
            format!(" (alias of {})", kind.name())
        } else {
            String::new()
        };
        let warmup = warmup_bars(kind.required_indicators());
        println!(
            "{name:<18} {} (warm-up {warmup} bars){alias}",
            indicators.join(", ")
        );
    }
    println!("Unknown names run as {}.", StrategyKind::SmaCrossover);
}

fn run_validate(config_path: &Path) -> Result<(), StratscopeError> {
    let config = load_config(config_path)?;
    validate_all(&config)?;

    let bt_config = build_backtest_config(&config)?;
    let symbols = resolve_symbols(None, &config)?;
    let strategies = resolve_strategies(None, &config)?;

    println!("Period:     {} to {}", bt_config.start_date, bt_config.end_date);
    println!("Capital:    {:.2}", bt_config.initial_capital);
    println!("Sharpe:     {}", bt_config.sharpe_mode.as_str());
    println!("Source:     {}", data_source(&config));
    println!("Symbols:    {}", symbols.join(", "));
    for name in &strategies {
        match StrategyKind::lookup(name) {
            Some(_) => println!("Strategy:   {name}"),
            None => println!(
                "Strategy:   {name} (not in catalog, runs as {})",
                StrategyKind::SmaCrossover
            ),
        }
    }
    let weights = score_weights(&config)?;
    for (factor, weight) in weights.iter() {
        println!("Weight:     {:<18} {weight:.3}", factor.key());
    }
    println!("Configuration is valid.");
    Ok(())
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<(), StratscopeError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;

    let configured = match symbol {
        Some(s) => parse_symbols(s).map_err(|e| list_error("symbols", e))?,
        None => symbol_list(&config)
            .map(|raw| parse_symbols(&raw).map_err(|e| list_error("symbols", e)))
            .transpose()?
            .unwrap_or_default(),
    };
    let stack = build_data_stack(&config, &configured)?;
    let symbols = if configured.is_empty() {
        stack.manager.list_symbols()?
    } else {
        configured
    };

    if symbols.is_empty() {
        eprintln!("no symbols found");
    }
    for s in &symbols {
        match stack.manager.data_range(s) {
            Ok(Some((first, last, count))) => println!("{s}: {count} bars, {first} to {last}"),
            Ok(None) => println!("{s}: no stored data"),
            Err(e) => log::warn!("error querying {s}: {e}"),
        }
    }
    Ok(())
}
