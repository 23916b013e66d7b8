//! # presenced — presence daemon
//!
//! Composition root that wires the sync engine to its adapters and feeds it
//! lock-state changes.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the tracing subscriber
//! - Construct the HTTP transport, clock and random source (adapters)
//! - Construct the sync engine, injecting adapters via port traits
//! - Read lock-state changes (`locked` / `unlocked`, one per line) from stdin
//! - Cancel pending retries on Ctrl-C or end of input
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use presence_adapter_http_ureq::UreqTransport;
use presence_app::ports::{ActionTransport, ChoiceSource, Clock, SystemClock};
use presence_app::random::RandomChoice;
use presence_app::sync_engine::SyncEngine;
use presence_domain::lock_state::{LockState, UnknownLockState};
use presence_domain::sync_status::SyncStatus;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

type Engine = SyncEngine<UreqTransport, SystemClock, RandomChoice>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let rules = config.rules()?;
    let settings = config.sync_settings()?;
    tracing::info!(
        rules = rules.len(),
        url = %config.api.url,
        policy = ?settings.status_policy,
        "starting presenced"
    );

    // Engine
    let transport = UreqTransport::new(&config.api);
    let engine: Engine = SyncEngine::new(rules, transport, SystemClock, RandomChoice, settings);
    let status_logger = tokio::spawn(log_status(engine.subscribe()));

    // Lock-state input
    let stdin = BufReader::new(tokio::io::stdin());
    run(&engine, stdin, tokio::signal::ctrl_c()).await?;

    status_logger.abort();
    tracing::info!(status = %engine.status(), "presenced stopped");

    Ok(())
}

/// Feed lock states read from `input` to the engine until the input ends or
/// `shutdown` resolves, then cancel any pending retry.
///
/// A shutdown requested while a pass is in flight is honoured before the
/// next line is read.
async fn run<T, C, R, I, S>(
    engine: &SyncEngine<T, C, R>,
    input: I,
    shutdown: S,
) -> std::io::Result<()>
where
    T: ActionTransport + 'static,
    C: Clock + 'static,
    R: ChoiceSource + 'static,
    I: AsyncBufRead + Unpin,
    S: Future<Output = std::io::Result<()>>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;
            result = &mut shutdown => {
                result?;
                tracing::info!("shutdown requested");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("lock-state input closed");
                    break;
                };
                match parse_line(&line) {
                    Some(Ok(state)) => {
                        tracing::info!(%state, "lock state changed");
                        engine.initiate_sync(state).await;
                    }
                    Some(Err(err)) => tracing::warn!(error = %err, "ignoring lock-state input"),
                    None => {}
                }
            }
        }
    }
    engine.shutdown().await;
    Ok(())
}

/// Parse one input line. Blank lines yield `None`.
fn parse_line(line: &str) -> Option<Result<LockState, UnknownLockState>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(line.parse())
}

async fn log_status(mut rx: watch::Receiver<SyncStatus>) {
    while rx.changed().await.is_ok() {
        let status = *rx.borrow_and_update();
        match status {
            SyncStatus::Failure { .. } => tracing::warn!(%status, "sync failed"),
            SyncStatus::Pending { .. } | SyncStatus::Success => {
                tracing::info!(%status, "sync status changed");
            }
        }
    }
}
