//! Ziftr Mining Client - Main Application
//!
//! Multi-threaded CPU miner for the ZiftrCOIN chained proof-of-work
//! algorithm.

use ziftr_mining_client::{
    config::Config,
    utils::{format_duration, format_hash_rate},
    worker::{CpuWorker, ScanOutcome},
    Error, Header, Nonce, Result, Target, APP_NAME, APP_VERSION,
};

use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load and validate configuration
    let config = Config::load().await?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Handle special commands
    if config.info {
        print_info();
        return Ok(());
    }

    if config.print_config {
        print_configuration(&config)?;
        return Ok(());
    }

    let (template, target) = mining_job(&config)?;

    info!("Starting {} v{}", APP_NAME, APP_VERSION);
    info!(
        "Configuration: threads={}, nonces={:08x}..{:08x}, difficulty level={}",
        config.thread_count,
        config.nonce_start,
        config.nonce_max,
        target.difficulty_level()
    );

    // Ctrl-C requests a cooperative stop; workers finish their current nonce
    let cancellation = CancellationToken::new();
    let signal_cancellation = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping");
            signal_cancellation.cancel();
        }
    });

    let worker = CpuWorker::new(config.thread_count);
    let started = Instant::now();

    let outcome = worker
        .mine(
            template,
            target,
            Nonce::new(config.nonce_start),
            Nonce::new(config.nonce_max),
            cancellation,
            None,
        )
        .await?;

    match outcome {
        ScanOutcome::Found { header, nonce, .. } => {
            info!("Found nonce {}", nonce);
            println!("nonce:  {}", nonce.to_hex());
            println!("header: {}", header.to_hex());
        }
        ScanOutcome::Exhausted {
            last_nonce,
            hashes_done,
        } => {
            info!(
                "Nonce range exhausted at {} after {} hashes",
                last_nonce, hashes_done
            );
        }
    }

    let stats = worker.stats();
    info!(
        "Mined {} hashes in {} ({})",
        stats.total_hashes,
        format_duration(started.elapsed().as_secs()),
        format_hash_rate(stats.average_hash_rate)
    );

    Ok(())
}

/// Resolve the header template and target for this run
fn mining_job(config: &Config) -> Result<(Header, Target)> {
    if config.benchmark {
        // Fixed job that never completes, for measuring the hash rate
        let template = Header::from_bytes(&[0u8; Header::SIZE])?;
        return Ok((template, Target::min()));
    }

    let template = config.header()?.ok_or_else(|| {
        Error::config("Block header is required for mining. Use --header or a config file")
    })?;
    let target = config.target()?.ok_or_else(|| {
        Error::config("Target is required for mining. Use --target or a config file")
    })?;

    Ok((template, target))
}

/// Print basic program information
fn print_info() {
    println!("{} v{}", APP_NAME, APP_VERSION);
    println!("CPU mining client for the ZiftrCOIN proof-of-work algorithm");
}

/// Print current configuration
fn print_configuration(config: &Config) -> Result<()> {
    let config_yaml = serde_yaml::to_string(config)?;
    println!("{}", config_yaml);
    Ok(())
}
