//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the surfbot paper trader.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::market_data::{load_frames, ReplayFeed, SyntheticFeed};
use crate::adapters::wallet::PaperWallet;
use crate::application::{run_backtest, BacktestReport, BotError, BotStatus, TickOutcome, TradingBot};
use crate::config::{load_config, Config, Preset};
use crate::domain::PerformanceTracker;
use crate::ports::{MarketDataError, MarketDataPort};

/// Surfbot - paper-trading position decision engine
#[derive(Parser, Debug)]
#[command(
    name = "surfbot",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Paper-trading position decision engine",
    long_about = "Surfbot polls a market feed, classifies buy/sell pressure and manages one \
                  simulated position at a time with stop loss, take profit, partial exit \
                  and trend reversal rules."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the polling loop against a paper wallet
    Run(RunCmd),

    /// Replay recorded frames through the engine
    Backtest(BacktestCmd),

    /// Show the effective configuration and idle bot status
    Status(StatusCmd),
}

/// Start polling loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replay recorded frames instead of the configured source
    #[arg(long, value_name = "FILE", conflicts_with = "synthetic")]
    pub replay: Option<PathBuf>,

    /// Use synthetic random-walk data even if a replay file is configured
    #[arg(long)]
    pub synthetic: bool,

    /// Override parameter preset
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Run exactly N ticks back to back, then stop
    #[arg(long, value_name = "N")]
    pub ticks: Option<usize>,

    /// Close any open position at the last price before exiting
    #[arg(long)]
    pub close_on_exit: bool,
}

/// Run backtest
#[derive(Parser, Debug)]
pub struct BacktestCmd {
    /// JSON file with recorded market frames
    #[arg(value_name = "FRAMES")]
    pub frames: PathBuf,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override parameter preset
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Starting capital for backtest
    #[arg(long, value_name = "AMOUNT")]
    pub capital: Option<f64>,

    /// Print every trade
    #[arg(short = 't', long)]
    pub trades: bool,

    /// Export report and trades to JSON
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,
}

/// Show status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    TrendSurfer,
    VolumeTracker,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::TrendSurfer => Preset::TrendSurfer,
            PresetArg::VolumeTracker => Preset::VolumeTracker,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config_path = match &app.command {
        Command::Run(cmd) => cmd.config.as_deref(),
        Command::Backtest(cmd) => cmd.config.as_deref(),
        Command::Status(cmd) => cmd.config.as_deref(),
    };
    let config = resolve_config(config_path)?;

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Backtest(cmd) => backtest_command(cmd, config),
        Command::Status(cmd) => status_command(cmd, config).await,
    }
}

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => {
            let mut config = Config::default();
            config
                .apply_env_overrides()
                .context("Invalid environment override")?;
            config.validate().context("Invalid configuration")?;
            Ok(config)
        }
    }
}

fn with_preset(mut config: Config, preset: Option<PresetArg>) -> Result<Config> {
    if let Some(preset) = preset {
        config.engine.preset = preset.into();
        config.validate().context("Preset override produced an invalid configuration")?;
    }
    Ok(config)
}

/// Initialize logging system. `--debug` and `--verbose` win over the
/// configured level; RUST_LOG wins over both.
fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Handle run command
async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    let config = with_preset(config, cmd.preset)?;
    tracing::info!("Starting surfbot (paper trading)...");

    let market: Arc<dyn MarketDataPort> = match (&cmd.replay, cmd.synthetic) {
        (Some(path), _) => Arc::new(
            ReplayFeed::load(path).with_context(|| format!("Failed to load replay {}", path.display()))?,
        ),
        (None, false) => match config.bot.replay_path()? {
            Some(path) => Arc::new(
                ReplayFeed::load(&path)
                    .with_context(|| format!("Failed to load replay {}", path.display()))?,
            ),
            None => synthetic_feed(&config),
        },
        (None, true) => synthetic_feed(&config),
    };

    let wallet = Arc::new(PaperWallet::new(config.bot.initial_capital));
    let bot = TradingBot::new(config.engine_config())
        .context("Failed to create trading bot")?
        .with_poll_interval(Duration::from_secs(config.bot.poll_interval_secs));
    bot.initialize(market).await;
    bot.connect(wallet.clone()).await;

    match cmd.ticks {
        Some(ticks) => run_ticks(&bot, ticks).await?,
        None => {
            bot.activate().await.context("Failed to activate bot")?;
            println!("✓ Polling every {}s - press Ctrl+C to stop", config.bot.poll_interval_secs);
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            println!("\nShutting down...");
            bot.deactivate().await;
        }
    }

    if cmd.close_on_exit {
        close_open_position(&bot).await?;
    }

    let status = bot.status().await;
    print_status(&status);
    print_performance(&bot.performance().await);
    println!("  Wallet balance:  {:.6}", wallet.balance().await);

    Ok(())
}

fn synthetic_feed(config: &Config) -> Arc<dyn MarketDataPort> {
    Arc::new(SyntheticFeed::new(
        config.bot.synthetic_seed,
        config.bot.synthetic_start_price,
        chrono::Duration::seconds(config.bot.poll_interval_secs as i64),
    ))
}

/// Drive a fixed number of ticks without waiting on the poll interval
async fn run_ticks(bot: &TradingBot, ticks: usize) -> Result<()> {
    for n in 0..ticks {
        match bot.tick().await {
            Ok(TickOutcome::Evaluated(decision)) => {
                if let Some(trade) = decision.trade() {
                    println!("[{}] {}", n + 1, trade);
                }
            }
            Ok(TickOutcome::Skipped(reason)) => {
                tracing::warn!("Tick {} skipped: {:?}", n + 1, reason);
            }
            Err(BotError::MarketData(MarketDataError::Exhausted)) => {
                tracing::info!("Feed exhausted after {} ticks", n);
                break;
            }
            Err(e) => tracing::error!("Tick {} failed: {}", n + 1, e),
        }
    }
    Ok(())
}

async fn close_open_position(bot: &TradingBot) -> Result<()> {
    let status = bot.status().await;
    if status.position.is_none() {
        return Ok(());
    }
    let Some(price) = status.last_price else {
        bail!("Cannot close position: no price observed yet");
    };

    if let Some(trade) = bot.close_position(price).await.context("Failed to close position")? {
        println!("Closed on exit: {}", trade);
    }
    Ok(())
}

/// Handle backtest command
fn backtest_command(cmd: BacktestCmd, config: Config) -> Result<()> {
    let config = with_preset(config, cmd.preset)?;
    let capital = cmd.capital.unwrap_or(config.bot.initial_capital);
    if !(capital > 0.0) {
        bail!("Starting capital must be > 0, got {}", capital);
    }

    tracing::info!("Starting backtest on {}", cmd.frames.display());
    let frames = load_frames(&cmd.frames)
        .with_context(|| format!("Failed to load frames from {}", cmd.frames.display()))?;

    let report = run_backtest(config.engine_config(), &frames, capital).context("Backtest failed")?;

    if cmd.trades {
        for trade in report.trades() {
            println!("{} {}", trade.timestamp.format("%Y-%m-%d %H:%M:%S"), trade);
        }
        println!();
    }
    print_backtest(&report);

    if let Some(path) = &cmd.export_json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Exported report to {}", path.display());
    }

    Ok(())
}

/// Handle status command
async fn status_command(cmd: StatusCmd, config: Config) -> Result<()> {
    let bot = TradingBot::new(config.engine_config())
        .context("Failed to create trading bot")?
        .with_poll_interval(Duration::from_secs(config.bot.poll_interval_secs));
    let status = bot.status().await;

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status).context("Failed to serialize status")?);
        }
        OutputFormat::Text => {
            print_status(&status);
            println!("  Poll interval:   {}s", config.bot.poll_interval_secs);
            println!("  Capital:         {:.4}", config.bot.initial_capital);
        }
    }
    Ok(())
}

fn print_status(status: &BotStatus) {
    let config = &status.config;
    println!();
    println!("======================================");
    println!("    Surfbot Status");
    println!("======================================");
    println!("  Active:          {}", if status.is_active { "YES" } else { "NO" });
    println!("  Market:          {}", status.market.as_deref().unwrap_or("-"));
    match (status.position, status.entry_price, status.entry_size) {
        (Some(side), Some(price), Some(size)) => {
            println!("  Position:        {} {:.6} @ {:.6}", side, size, price);
            println!("  Partial taken:   {}", status.partial_taken);
        }
        _ => println!("  Position:        none"),
    }
    if let Some(price) = status.last_price {
        println!("  Last price:      {:.6}", price);
    }
    println!("  Realized P/L:    {:.6}", status.realized_pnl);
    println!("  Entry mode:      {:?}", config.entry.mode);
    println!("  Stop loss:       {}%", config.stop_loss_pct);
    println!("  Take profit:     {}%", config.take_profit_pct);
    if let Some(pct) = config.partial_take_profit_pct {
        println!(
            "  Partial exit:    {:.0}% of size at +{}%",
            config.partial_take_profit_fraction * 100.0,
            pct
        );
    }
    println!("  Position size:   {:.1}% of capital", config.effective_size_fraction() * 100.0);
}

fn print_performance(performance: &PerformanceTracker) {
    println!("--------------------------------------");
    println!("  Entries:         {}", performance.entries);
    println!(
        "  Exits:           {} full, {} partial",
        performance.full_exits, performance.partial_exits
    );
    println!(
        "  Wins / losses:   {} / {} ({:.1}% win rate)",
        performance.winning_exits,
        performance.losing_exits,
        performance.win_rate()
    );
    println!("  Profit factor:   {:.2}", performance.profit_factor());
    println!("  Largest win:     {:.6}", performance.largest_win);
    println!("  Largest loss:    {:.6}", performance.largest_loss);
    for day in performance.daily_pnl() {
        println!("  {}      {:+.6}", day.date, day.profit);
    }
}

fn print_backtest(report: &BacktestReport) {
    println!("======================================");
    println!("    Backtest Report");
    println!("======================================");
    println!("  Cycles:          {} ({} skipped)", report.cycles, report.skipped);
    println!("  Initial capital: {:.6}", report.initial_capital);
    println!("  Final cash:      {:.6}", report.final_capital);
    if let Some(position) = &report.open_position {
        println!(
            "  Open position:   {} {:.6} @ {:.6} (value {:.6})",
            position.side, position.size, position.entry_price, report.open_value
        );
    }
    println!("  Return:          {:+.2}%", report.return_pct());
    print_performance(&report.performance);
}
