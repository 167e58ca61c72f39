//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_broker::{PaperBroker, PaperSettings};
use crate::adapters::system_clock::SystemClock;
use crate::domain::config::{load_bot_config, BotConfig};
use crate::domain::error::BotError;
use crate::domain::orchestrator::{CycleOutcome, CycleReport, Orchestrator};
use crate::domain::scheduler::Scheduler;
use crate::ports::execution_port::ExecutionPort;

#[derive(Parser, Debug)]
#[command(name = "zonetrader", about = "Intraday bracket-order trading loop", version)]
pub struct Cli {
    /// Log filter when RUST_LOG is unset (overrides [logging] level)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect and evaluate on the configured schedule until terminated
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Connect, evaluate a single cycle and exit
    Once {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file and print the resolved settings
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let log_level = cli.log_level;
    match cli.command {
        Command::Run { config } => run_loop(&config, log_level.as_deref()),
        Command::Once { config } => run_once(&config, log_level.as_deref()),
        Command::Check { config } => run_check(&config),
    }
}

/// Load and validate configuration; both the INI adapter and the typed config.
pub fn load_config(path: &Path) -> Result<(FileConfigAdapter, BotConfig), BotError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = load_bot_config(&adapter)?;
    Ok((adapter, config))
}

fn init_logging(cli_level: Option<&str>, config_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli_level.unwrap_or(config_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // a subscriber may already be installed by an embedding process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn fail(err: &BotError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

struct Prepared {
    config: BotConfig,
    paper: PaperSettings,
}

fn prepare(path: &Path, log_level: Option<&str>) -> Result<Prepared, BotError> {
    let (adapter, config) = load_config(path)?;
    init_logging(log_level, &config.log_level);
    info!(config = %path.display(), symbol = %config.symbol, "configuration loaded");
    let paper = PaperSettings::from_config(&adapter, &config.session)?;
    Ok(Prepared { config, paper })
}

fn connect<'a>(prepared: &Prepared, clock: &'a SystemClock) -> Result<PaperBroker<'a>, BotError> {
    let broker = PaperBroker::connect(prepared.paper.clone(), &prepared.config.symbol, clock)?;
    match broker.account_snapshot() {
        Ok(account) => info!(
            login = %account.login,
            server = %account.server,
            balance = account.balance,
            equity = account.equity,
            currency = %account.currency,
            "session started"
        ),
        Err(e) => return Err(BotError::Session { reason: e.to_string() }),
    }
    Ok(broker)
}

fn run_loop(path: &Path, log_level: Option<&str>) -> ExitCode {
    let prepared = match prepare(path, log_level) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let clock = SystemClock;
    let broker = match connect(&prepared, &clock) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "session initialization failed");
            return fail(&e);
        }
    };

    let mut orchestrator = Orchestrator::new(&prepared.config, &broker, &broker, &clock);
    let mut scheduler = Scheduler::from_settings(&prepared.config.schedule);
    scheduler.run_forever(&mut orchestrator, &clock)
}

fn run_once(path: &Path, log_level: Option<&str>) -> ExitCode {
    let prepared = match prepare(path, log_level) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let clock = SystemClock;
    let broker = match connect(&prepared, &clock) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "session initialization failed");
            return fail(&e);
        }
    };

    let report = {
        let mut orchestrator = Orchestrator::new(&prepared.config, &broker, &broker, &clock);
        orchestrator.evaluate()
    };
    println!("{}", describe(&report));
    broker.shutdown();
    ExitCode::SUCCESS
}

fn run_check(path: &Path) -> ExitCode {
    let (adapter, config) = match load_config(path) {
        Ok(loaded) => loaded,
        Err(e) => return fail(&e),
    };
    if let Err(e) = PaperSettings::from_config(&adapter, &config.session) {
        return fail(&e);
    }
    print!("{}", summarize(&config));
    ExitCode::SUCCESS
}

/// Human-readable one-line summary of a cycle.
pub fn describe(report: &CycleReport) -> String {
    let detail = match &report.outcome {
        CycleOutcome::NonTradingDay => "not a trading day".to_string(),
        CycleOutcome::CoolingDown { until } => format!("cooling down until {}", until),
        CycleOutcome::Blocked { positions } => {
            format!("{} position(s) already open", positions.len())
        }
        CycleOutcome::NoSignal { snapshot } => format!(
            "no signal (trend {:?}, zone {:?}, close {})",
            snapshot.latest_trend(),
            snapshot.latest_zone(),
            snapshot.last_close
        ),
        CycleOutcome::Submitted { request, result } => format!(
            "order placed: {} (ticket {})",
            request,
            result.ticket.map_or_else(|| "-".to_string(), |t| t.to_string())
        ),
        CycleOutcome::Rejected { request, result } => format!(
            "order rejected: {} (retcode {}, {})",
            request,
            result.retcode,
            result.reason.as_deref().unwrap_or("no reason")
        ),
        CycleOutcome::SubmitFailed { request, error } => {
            format!("order not sent: {} ({})", request, error)
        }
        CycleOutcome::Abandoned { error } => format!("cycle abandoned: {}", error),
    };
    match report.cooldown_until {
        Some(until) => format!("[{}] {}; next evaluation after {}", report.outcome.label(), detail, until),
        None => format!("[{}] {}", report.outcome.label(), detail),
    }
}

/// Resolved settings as printed by `check`.
pub fn summarize(config: &BotConfig) -> String {
    let ind = &config.indicators;
    let sched = &config.schedule;
    format!(
        "symbol: {}\n\
         trend: EMA({}) vs EMA({}) on {} x{}\n\
         zones: {} on {} x{}\n\
         risk: lot {} sl {} pts tp {} pts\n\
         schedule: every {}s (poll {}s) on {}\n\
         cooldowns: blocked {}s, no signal {}s, after entry {}s\n",
        config.symbol,
        ind.fast_length,
        ind.slow_length,
        ind.trend_timeframe,
        ind.trend_bars,
        ind.zone_method,
        ind.zone_timeframe,
        ind.zone_bars,
        config.risk.lot,
        config.risk.stop_loss_points,
        config.risk.take_profit_points,
        sched.interval.num_seconds(),
        sched.poll.as_secs(),
        sched.trading_days,
        sched.cooldowns.blocked.num_seconds(),
        sched.cooldowns.no_signal.num_seconds(),
        sched.cooldowns.entry.num_seconds(),
    )
}
