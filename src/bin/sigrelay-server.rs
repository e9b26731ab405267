//! SIGRELAY Maintenance Daemon
//!
//! Runs the liveness and message expiration sweepers against a realm
//! until interrupted.

use clap::Parser;
use sigrelay::realm::{Client, Message, Registry};
use sigrelay::{Config, ExpirationSweeper, LivenessSweeper, Realm, SweepMetrics, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// SIGRELAY - Signaling relay maintenance
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Idle time before a client connection is considered broken (ms)
    #[arg(long, default_value_t = 60_000)]
    alive_timeout: u64,

    /// Unread time before a message queue expires (ms)
    #[arg(long, default_value_t = 5_000)]
    expire_timeout: u64,

    /// Delay between message expiration sweeps (ms)
    #[arg(long, default_value_t = 1_000)]
    cleanup_out_msgs: u64,

    /// Delay between liveness sweeps (ms)
    #[arg(long, default_value_t = 300)]
    check_interval: u64,

    /// Registry shard count (0 = DashMap default)
    #[arg(long, default_value_t = 0)]
    shards: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sigrelay=info".parse()?))
        .init();

    let args = Args::parse();

    let config = Config::default()
        .with_alive_timeout(Duration::from_millis(args.alive_timeout))
        .with_expire_timeout(Duration::from_millis(args.expire_timeout))
        .with_cleanup_interval(Duration::from_millis(args.cleanup_out_msgs))
        .with_check_interval(Duration::from_millis(args.check_interval));
    config.validate()?;

    let realm = if args.shards == 0 {
        Realm::new()
    } else {
        Realm::with_shard_amount(args.shards)
    };
    let clock = Arc::new(SystemClock);
    let metrics = Arc::new(SweepMetrics::new());

    let liveness = LivenessSweeper::new(Arc::new(realm.clone()), clock.clone(), &config)
        .with_metrics(metrics.clone())
        .with_observer(|client| {
            info!(client = %client.id(), "Client connection timed out");
        });

    // EXPIRE notices go straight to a connected sender and are never queued
    let outbound = realm.clone();
    let notifier = move |_origin: Option<&Arc<Client>>, message: Message| {
        let Some(dst) = message.dst.as_ref() else {
            return;
        };
        match outbound.client(dst).and_then(|c| c.connection()) {
            Some(connection) => {
                if let Err(e) = connection.send(&message) {
                    debug!(client = %dst, error = %e, "Dropping EXPIRE notice");
                }
            }
            None => debug!(client = %dst, "Sender offline, dropping EXPIRE notice"),
        }
    };

    let expiration =
        ExpirationSweeper::new(Arc::new(realm.clone()), clock, Arc::new(notifier), &config)
            .with_metrics(metrics.clone());

    info!(
        "Starting SIGRELAY maintenance: alive_timeout={:?}, expire_timeout={:?}",
        config.alive_timeout, config.expire_timeout
    );

    liveness.start();
    expiration.start_messages_expiration();

    tokio::signal::ctrl_c().await?;

    liveness.stop();
    expiration.stop_messages_expiration();

    info!("{}", metrics.summary());

    Ok(())
}
