use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

use meteora_lp_console::agent::{self, AgentClient, ControlSession, PollCadence, Poller};
use meteora_lp_console::config::{self, Config};
use meteora_lp_console::db::ClientStore;
use meteora_lp_console::errors::SessionResult;
use meteora_lp_console::models::{PriceSnapshot, SessionConfig};
use meteora_lp_console::monitoring::{EventChannel, WebSocketEventSource};
use meteora_lp_console::pricing::{PriceConversionEngine, Unit};
use meteora_lp_console::state::{ConsoleState, RunningFlag, SharedState, VisibilityFlag};
use meteora_lp_console::utils::{format_conversion, format_pool_line, parse_amount};

/// How often `watch` prints the pool summary
const SUMMARY_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "lp-console", about = "Monitor and control a Meteora LP agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the agent's event stream and print a summary every 30s
    Watch,
    /// Start scanning with the given criteria (defaults otherwise)
    Start {
        /// JSON file with scan and execution criteria
        #[arg(long)]
        criteria: Option<PathBuf>,
    },
    Stop,
    /// Claim unclaimed fees from a pool
    Claim { pool: String },
    /// Add liquidity, in the pool's base-token native units
    Increase { pool: String, amount: String },
    /// Withdraw a percentage of a position
    Withdraw { pool: String, percent: String },
    /// Ask the agent to switch its wallet key
    RotateKey {
        #[arg(long)]
        new_key: String,
        #[arg(long)]
        admin_credential: String,
    },
    /// Store the shared secret sent with every command
    SetSecret { secret: String },
    ClearSecret,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_logger();

    let cli = Cli::parse();
    let config = config::load_config()?;
    let store = ClientStore::new(&config.database_path).await?;

    match cli.command {
        Command::Watch => watch_agent(&config, &store).await,
        Command::Start { criteria } => {
            let criteria = load_criteria(criteria.as_deref())?;
            let client = agent::create_client_from_config(&config, &store).await?;
            let prices = fetch_prices_once(&client).await;
            let mut session = ControlSession::new(client, criteria, RunningFlag::new(false), prices);
            report(session.start().await)
        }
        Command::Stop => {
            let mut session = command_session(&config, &store).await?;
            report(session.stop().await)
        }
        Command::Claim { pool } => {
            let session = command_session(&config, &store).await?;
            report(session.claim_fees(&pool).await)
        }
        Command::Increase { pool, amount } => {
            let amount = parse_amount(&amount).with_context(|| format!("Invalid amount: {}", amount))?;
            let session = command_session(&config, &store).await?;
            report(session.increase_liquidity(&pool, amount).await)
        }
        Command::Withdraw { pool, percent } => {
            let percent = parse_amount(&percent).with_context(|| format!("Invalid percent: {}", percent))?;
            let session = command_session(&config, &store).await?;
            report(session.withdraw_liquidity(&pool, percent).await)
        }
        Command::RotateKey {
            new_key,
            admin_credential,
        } => {
            let session = command_session(&config, &store).await?;
            let public_key = report(session.rotate_wallet_key(&new_key, &admin_credential).await)?;
            info!("Agent wallet is now {}", public_key);
            Ok(())
        }
        Command::SetSecret { secret } => store.save_secret(&secret).await,
        Command::ClearSecret => {
            if !store.clear_secret().await? {
                info!("No shared secret was stored");
            }
            Ok(())
        }
    }
}

/// Session for one-shot commands; criteria and prices are irrelevant here
async fn command_session(config: &Config, store: &ClientStore) -> Result<ControlSession> {
    let client = agent::create_client_from_config(config, store).await?;
    if !client.has_secret() {
        warn!("No shared secret stored; the agent will likely refuse this command");
    }
    let (_tx, prices) = watch::channel(PriceSnapshot::default());
    Ok(ControlSession::new(
        client,
        SessionConfig::default(),
        RunningFlag::new(false),
        prices,
    ))
}

fn load_criteria(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        info!("No criteria file given, using defaults");
        return Ok(SessionConfig::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read criteria file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid criteria file {}", path.display()))
}

/// Single price lookup so a USD buy size can be converted before start
async fn fetch_prices_once(client: &AgentClient) -> watch::Receiver<PriceSnapshot> {
    let snapshot = match client.fetch_prices().await {
        Ok(response) => PriceSnapshot::default().merged_with(&response),
        Err(e) => {
            warn!("Could not fetch prices: {:#}", e);
            PriceSnapshot::default()
        }
    };
    let (_tx, rx) = watch::channel(snapshot);
    rx
}

/// Surface auth failures separately so the operator knows to fix the secret
fn report<T>(result: SessionResult<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_auth_failure() => {
            error!("Authentication failed. Store the agent's secret with `lp-console set-secret`.");
            Err(e.into())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            Err(e.into())
        }
    }
}

async fn watch_agent(config: &Config, store: &ClientStore) -> Result<()> {
    let url = Url::parse(&config.events_url)
        .with_context(|| format!("Invalid AGENT_EVENTS_URL: {}", config.events_url))?;
    let client = agent::create_client_from_config(config, store).await?;

    let running = RunningFlag::new(false);
    let visible = VisibilityFlag::new(true);
    let state = ConsoleState::shared(running.clone());

    info!("Subscribing to agent events at {}", url);
    let channel = EventChannel::new(WebSocketEventSource::connect(url), state.clone()).spawn();
    let poller = Poller::start(client, PollCadence::from_config(config), &running, &visible);

    let mut summary = tokio::time::interval(SUMMARY_INTERVAL);
    loop {
        tokio::select! {
            _ = summary.tick() => print_summary(&state, &poller, config),
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    poller.stop();
    channel.cancel();
    Ok(())
}

fn print_summary(state: &SharedState, poller: &Poller, config: &Config) {
    let engine = PriceConversionEngine::new(poller.prices().borrow().clone());
    let portfolio = poller.portfolio().borrow().clone();

    // Collect under the lock, log after releasing it
    let mut lines = Vec::new();
    {
        let state = ConsoleState::lock(state);
        lines.push(format!(
            "Agent {} | stream {} | {} pools tracked, {} opened by the bot",
            if state.is_running() { "RUNNING" } else { "STOPPED" },
            if state.is_connected() { "connected" } else { "waiting" },
            state.pools.len(),
            state.pools.bot_created().len()
        ));

        let ages = state.pools.classify_by_age(config.position_format_cutover);
        if !ages.legacy.is_empty() {
            lines.push(format!("{} positions predate the current format", ages.legacy.len()));
        }

        lines.extend(state.pools.active().into_iter().map(format_pool_line));
        if let Some(entry) = state.logs.latest() {
            lines.push(format!("Last agent log: {}", entry));
        }
    }

    if let Some(sol) = portfolio.sol_balance {
        let usd = engine.convert(sol, &Unit::Sol, &Unit::Usd);
        lines.push(format!("Wallet: {} SOL ({})", sol, format_conversion(&usd)));
    }

    for line in lines {
        info!("{}", line);
    }
}

fn init_logger() {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
}
