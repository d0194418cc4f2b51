//! Rotator - Multi-chain momentum token rotation
//!
//! Runs one chain worker per configured chain against the 1inch aggregator.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use token_rotator::adapters::cli::{
    self, CheckConfigCmd, Command, ControlCommand, DiscoverCmd, QuoteCmd, RunCmd,
};
use token_rotator::adapters::{OneInchClient, OneInchConfig, PaperWallet};
use token_rotator::application::{
    ChainSettings, ChainWorker, Collaborators, Supervisor, WorkerSettings,
};
use token_rotator::config::{load_config, ChainSection, Config, LoggingSection};
use token_rotator::ports::{ChainCatalog, PriceOracle, RoundTripVetter};
use token_rotator::strategy::{ScoringParams, TradingSetParams};

type PaperAccount = PaperWallet<Arc<OneInchClient>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in the config file)
    dotenvy::dotenv().ok();

    let app = cli::init();

    let config_path = app.command.config_path().to_path_buf();
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    init_logging(&config.logging, app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Quote(cmd) => quote_command(cmd, config).await,
        Command::Discover(cmd) => discover_command(cmd, config).await,
        Command::CheckConfig(cmd) => check_config_command(cmd, config),
    }
}

/// Configured level, raised by `--verbose` / `--debug`, overridden by RUST_LOG
fn init_logging(logging: &LoggingSection, verbose: bool, debug: bool) -> Result<()> {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if logging.log_to_file {
        let path = logging.log_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    Ok(())
}

fn one_inch_client(config: &Config, chain_id: u64) -> Result<OneInchClient> {
    let section = &config.one_inch;
    if section.get_api_key().is_none() {
        warn!("No 1inch API key configured (set ONE_INCH_API_KEY); requests may be rejected");
    }

    let client_config = OneInchConfig {
        api_base_url: section.api_url.clone(),
        api_key: section.get_api_key(),
        wallet_address: section.get_wallet_address(),
        timeout: Duration::from_secs(section.timeout_secs),
    };

    OneInchClient::new(client_config, chain_id).context("Failed to create 1inch client")
}

fn find_chain<'a>(config: &'a Config, name: &str) -> Result<&'a ChainSection> {
    config.chain(name).with_context(|| {
        let known: Vec<&str> = config.chains.iter().map(|c| c.name.as_str()).collect();
        format!("Unknown chain '{}' (configured: {})", name, known.join(", "))
    })
}

fn build_worker(config: &Config, chain: &ChainSection) -> Result<(ChainWorker, Arc<PaperAccount>)> {
    let client = Arc::new(one_inch_client(config, chain.chain_id)?);
    let wallet = Arc::new(
        PaperWallet::new(
            client.clone(),
            &chain.native_token,
            config.paper.initial_native_balance,
        )
        .with_slippage(config.paper.slippage_bps),
    );

    let ports = Collaborators {
        oracle: client.clone(),
        catalog: client.clone(),
        wallet: wallet.clone(),
        executor: wallet.clone(),
        vetter: Arc::new(RoundTripVetter::new(client)),
    };

    let worker = ChainWorker::new(
        ChainSettings::from(chain),
        WorkerSettings::from(config),
        ScoringParams::from(config),
        TradingSetParams::from(config),
        ports,
    );

    Ok((worker, wallet))
}

async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    if !config.paper.enabled {
        bail!("Live execution is not supported; set [paper] enabled = true");
    }

    let chains: Vec<&ChainSection> = match cmd.chain {
        Some(ref name) => vec![find_chain(&config, name)?],
        None => config.chains.iter().collect(),
    };

    info!("Starting rotator on {} chain(s)", chains.len());
    warn!("PAPER TRADING MODE - no real transactions");

    let mut workers = Vec::with_capacity(chains.len());
    let mut wallets = Vec::with_capacity(chains.len());
    for chain in chains {
        let (worker, wallet) = build_worker(&config, chain)?;
        workers.push(worker);
        wallets.push((chain.name.clone(), wallet));
    }

    let supervisor = Supervisor::spawn(workers);
    info!("Type 'fallback <chain>' to move a chain into stable, Ctrl+C to stop");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => handle_control(&supervisor, &line),
                // Detached or piped input: keep running until Ctrl+C
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("Stopped reading commands: {}", e);
                    stdin_open = false;
                }
            },
        }
    }
    info!("Shutdown signal received");

    for status in supervisor.shutdown().await {
        info!(
            "{}: {} after {} passes - maturity {}, {} indexed, members {:?}, native roi {}",
            status.chain,
            status.state,
            status.pass,
            status.maturity,
            status.indexed_tokens,
            status.members,
            status
                .native_roi_pct
                .map_or_else(|| "-".to_string(), |roi| format!("{:.2}%", roi))
        );
    }

    for (_, wallet) in &wallets {
        wallet.log_summary().await;
    }

    if let Some(path) = cmd.export_trades {
        let mut trades: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
        for (chain, wallet) in &wallets {
            let log = wallet
                .export_trades_json()
                .await
                .context("Failed to serialize trades")?;
            trades.insert(chain.as_str(), serde_json::from_str(&log)?);
        }
        let json = serde_json::to_string_pretty(&trades).context("Failed to serialize trades")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write trades to {}", path.display()))?;
        info!("Trade log written to {}", path.display());
    }

    info!("Rotator stopped");
    Ok(())
}

fn handle_control(supervisor: &Supervisor, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match line.parse::<ControlCommand>() {
        Ok(ControlCommand::Fallback(chain)) => {
            if supervisor.request_fallback(&chain) {
                info!("Fallback for {} takes effect on its next managing pass", chain);
            }
        }
        Ok(ControlCommand::Help) => info!(
            "Commands: fallback <chain> (one of {}), help",
            supervisor.chains().join(", ")
        ),
        Err(e) => warn!("{}", e),
    }
}

async fn quote_command(cmd: QuoteCmd, config: Config) -> Result<()> {
    let chain = find_chain(&config, &cmd.chain)?;
    let client = one_inch_client(&config, chain.chain_id)?;
    let token = cmd.token.to_lowercase();

    // Native is priced in stable, everything else in native
    let (reference, amount) = if token == chain.native_token {
        (chain.stable_token.as_str(), config.worker.native_quote_amount)
    } else {
        (chain.native_token.as_str(), config.worker.quote_amount)
    };

    let quote = client
        .quote(&token, reference, amount)
        .await
        .context("Failed to get quote")?;

    println!("Chain: {} ({})", chain.name, chain.chain_id);
    println!("Quote: {} {} -> {} {}", amount, reference, quote.amount_out, token);
    if let Some(gas) = quote.gas {
        println!("Estimated gas: {}", gas);
    }

    Ok(())
}

async fn discover_command(cmd: DiscoverCmd, config: Config) -> Result<()> {
    let chain = find_chain(&config, &cmd.chain)?;
    let client = one_inch_client(&config, chain.chain_id)?;

    let tokens = client
        .discover_tokens(chain.chain_id)
        .await
        .context("Failed to list tokens")?;

    let mut listed: Vec<_> = tokens.iter().collect();
    listed.sort_by(|a, b| a.1.symbol.cmp(&b.1.symbol).then_with(|| a.0.cmp(b.0)));

    println!("{} tradable tokens on {}", listed.len(), chain.name);
    for (address, meta) in listed.iter().take(cmd.limit.unwrap_or(usize::MAX)) {
        println!("  {:<12} {:>3}  {}  {}", meta.symbol, meta.decimals, address, meta.name);
    }

    Ok(())
}

fn check_config_command(cmd: CheckConfigCmd, config: Config) -> Result<()> {
    println!("Configuration OK: {}", cmd.config.display());
    println!(
        "  Trading set: max {} (scouting needs {}), admission {}",
        config.trading_set.max_size,
        config.trading_set.min_set_size,
        config.trading_set.admission_score
    );
    println!(
        "  Worker: poll {}s, cooldown {} passes, call timeout {}s",
        config.worker.poll_interval_secs,
        config.worker.cooldown_passes,
        config.worker.call_timeout_secs
    );
    for chain in &config.chains {
        println!(
            "  Chain {} ({}): native {}, stable {}",
            chain.name, chain.chain_id, chain.native_token, chain.stable_token
        );
    }
    if config.one_inch.get_api_key().is_none() {
        println!("  Warning: no 1inch API key (set ONE_INCH_API_KEY)");
    }

    Ok(())
}
