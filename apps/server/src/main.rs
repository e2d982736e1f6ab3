//! Loopswap Bot - Headless Server
//!
//! Cyclic arbitrage over constant-product pools: refresh reserves, evaluate
//! every 3-hop and 4-hop loop through the reference asset, fire the
//! profitable ones as single atomic transactions.

mod config;
mod stats;

use clap::Parser;
use config::AppConfig;
use stats::{run_stats_reporter, BotStats};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use loopswap_core::{AddressBook, LoopShape, Symbol};
use loopswap_engine::{
    ArbitrageEngine, EngineConfig, LoopSubmitter, PairRegistry, PathSet, WalletBalance,
};
use loopswap_feeds::{
    AccountMessage, AccountReader, AccountSubscriber, PoolListingClient, RpcAccountReader,
    SubscriptionConfig,
};
use loopswap_executor::{LoopAssembler, SolanaChainClient, SwapExecutor};
use solana_sdk::signature::read_keypair_file;
use solana_sdk::signer::Signer;

/// Attempts at building the pair registry before giving up.
const STARTUP_ATTEMPTS: u32 = 3;

/// Loopswap Bot CLI
#[derive(Parser, Debug)]
#[command(name = "loopswap-bot")]
#[command(about = "Cyclic constant-product arbitrage bot", long_about = None)]
struct Args {
    /// Reference asset symbol; every loop starts and ends here
    reference: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

/// Log and exit. Only used for unrecoverable startup failures.
fn fatal(context: &str, err: impl Display) -> ! {
    error!("{}: {}", context, err);
    std::process::exit(1);
}

/// Configured assets plus the reference, minus any asset the wallet holds no
/// token account for.
fn tradable_assets(
    mut assets: Vec<Symbol>,
    reference: &Symbol,
    address_book: &AddressBook,
) -> Vec<Symbol> {
    if !assets.contains(reference) {
        assets.push(reference.clone());
    }
    assets.retain(|asset| {
        let known = address_book.contains(asset);
        if !known {
            warn!("No token account for {}, leaving it out of every path", asset);
        }
        known
    });
    assets
}

/// Apply balance notifications until the subscription side hangs up.
async fn run_balance_listener(
    mut rx: mpsc::Receiver<AccountMessage>,
    balance: WalletBalance,
    stats: Arc<BotStats>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            AccountMessage::Update { slot, data } => match balance.apply_account_data(&data) {
                Ok(amount) => {
                    stats.record_balance_update();
                    debug!("Balance {} at slot {}", amount, slot);
                }
                Err(e) => warn!("Undecodable balance notification at slot {}: {}", slot, e),
            },
            AccountMessage::Connected => info!("Balance subscription connected"),
            AccountMessage::Disconnected => warn!("Balance subscription disconnected"),
            AccountMessage::Reconnected => {
                info!("Balance subscription reconnected; notifications in between were missed")
            }
            AccountMessage::Error(e) => warn!("Balance subscription error: {}", e),
        }
    }
    warn!("Balance subscription closed");
}

async fn run_engine_loop<R, S>(
    mut engine: ArbitrageEngine<R, S>,
    stats: Arc<BotStats>,
    interval: Duration,
) where
    R: AccountReader + ?Sized,
    S: LoopSubmitter,
{
    info!("Starting engine loop");
    loop {
        let report = engine.run_cycle().await;
        stats.record(&report);
        debug!(
            "Cycle: {} paths, {} opportunities, {} fires, best margin {:?}",
            report.paths_evaluated, report.opportunities, report.fires, report.best_margin
        );
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config = AppConfig::from_env();
    init_logging(config.as_ref().map_or("info", |c| c.log_level.as_str()));
    let config = config.unwrap_or_else(|e| fatal("Failed to load configuration", e));

    let reference = Symbol::new(&args.reference);
    let engine_config = EngineConfig::from(&config.engine);

    info!("Loopswap Bot starting...");
    info!("  Reference: {}", reference);
    info!("  RPC: {}", config.network.rpc_url);
    info!("  WebSocket: {}", config.network.ws_url);
    info!("  Mode: {:?}", config.execution.mode);
    info!(
        "  Min Profit: {} | Burst: {} x{} | Cooldown: {:?}",
        engine_config.min_profit,
        engine_config.burst_threshold,
        engine_config.burst_repeats,
        engine_config.cooldown
    );

    let signer = read_keypair_file(&config.wallet.keypair_path)
        .unwrap_or_else(|e| fatal("Failed to read keypair", e));
    info!("  Wallet: {}", signer.pubkey());

    let address_book = config
        .wallet
        .address_book()
        .unwrap_or_else(|e| fatal("Invalid address book", e));
    let Some(reference_account) = address_book.token_account(&reference) else {
        fatal("Reference asset not in address book", &reference);
    };
    let swap_program = config
        .program
        .swap_program()
        .unwrap_or_else(|e| fatal("Invalid program id", e));
    let token_program = config
        .program
        .token_program()
        .unwrap_or_else(|e| fatal("Invalid program id", e));

    let assets = tradable_assets(config.engine.symbols(), &reference, &address_book);
    info!("  Assets: {} ({} in address book)", assets.len(), address_book.len());
    let denylist = config.engine.denylist();

    // Static pool metadata
    let listing_client = PoolListingClient::new(config.network.pool_feed_url.as_str())
        .unwrap_or_else(|e| fatal("Invalid pool listing URL", e));
    let listings = listing_client
        .fetch()
        .await
        .unwrap_or_else(|e| fatal("Failed to fetch pool listing", e));
    info!("Fetched {} pool listings", listings.len());

    let reader = Arc::new(
        RpcAccountReader::new(config.network.rpc_url.as_str(), config.network.commitment.as_str())
            .unwrap_or_else(|e| fatal("Failed to create RPC reader", e)),
    );
    let registry = PairRegistry::build_with_retry(
        &listings,
        &assets,
        &denylist,
        reader.as_ref(),
        STARTUP_ATTEMPTS,
    )
    .await
    .unwrap_or_else(|e| fatal("Failed to build pair registry", e));
    let paths = PathSet::build(&registry, &reference, &assets, &denylist)
        .unwrap_or_else(|e| fatal("Failed to build paths", e));
    info!(
        "Paths: {} triangles, {} quads",
        paths.count(LoopShape::Triangle),
        paths.count(LoopShape::Quad)
    );

    // Reference balance: one read now, then pushed updates
    let stats = Arc::new(BotStats::new());
    let balance = WalletBalance::default();
    match reader.read_account(&reference_account).await {
        Ok(data) => match balance.apply_account_data(&data) {
            Ok(amount) => info!("Initial {} balance: {}", reference, amount),
            Err(e) => warn!("Initial balance undecodable, starting at 0: {}", e),
        },
        Err(e) => warn!("Initial balance read failed, starting at 0: {}", e),
    }

    let (tx, rx) = mpsc::channel(64);
    let listener_handle = tokio::spawn(run_balance_listener(rx, balance.clone(), stats.clone()));

    let subscription = SubscriptionConfig {
        commitment: config.network.commitment.clone(),
        ..SubscriptionConfig::new(config.network.ws_url.as_str(), reference_account)
    };
    let subscriber = AccountSubscriber::new(subscription, tx);
    let stream = subscriber
        .connect_with_retry()
        .await
        .unwrap_or_else(|e| fatal("Balance subscription failed", e));
    let subscriber_handle = tokio::spawn(async move {
        if let Err(e) = subscriber.run(stream).await {
            error!("Balance subscription stopped: {}", e);
        }
    });

    let stats_handle = tokio::spawn(run_stats_reporter(
        stats.clone(),
        Duration::from_secs(config.stats_interval_secs.max(1)),
    ));

    // Execution
    let chain = Arc::new(SolanaChainClient::new(
        config.network.rpc_url.as_str(),
        config.execution.skip_preflight,
    ));
    let assembler = LoopAssembler::new(swap_program, token_program, address_book);
    let executor = SwapExecutor::new(assembler, chain, signer, config.execution.mode.into());

    let engine = ArbitrageEngine::new(
        &engine_config,
        Arc::new(registry),
        paths,
        balance,
        reader,
        executor,
    );

    tokio::select! {
        _ = run_engine_loop(engine, stats.clone(), engine_config.cycle_interval) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            warn!("Shutdown signal received");
        }
    }

    subscriber_handle.abort();
    listener_handle.abort();
    stats_handle.abort();

    let summary = stats.summary();
    info!("Final Stats:");
    info!("  Total uptime: {} seconds", summary.uptime_secs);
    info!("  Cycles: {} ({} stale)", summary.cycles, summary.refresh_failures);
    info!("  Opportunities: {}", summary.opportunities);
    info!("  Fires: {} ({} failed)", summary.fires, summary.submit_failures);

    info!("Loopswap Bot stopped");
}
