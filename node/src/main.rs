// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Assent Ledger Node
//!
//! Entry point for the `assent-node` binary. Parses CLI arguments,
//! initializes logging and metrics, loads the ledger and serves the
//! HTTP/WS API.
//!
//! The binary supports four subcommands:
//!
//! - `run`           — host a ledger and serve the API
//! - `keygen`        — generate an account key
//! - `sign-approval` — sign a mint approval off-line
//! - `version`       — print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod rpc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use assent_contracts::{LedgerSnapshot, MintApproval, MultiToken, TokenVault};
use assent_protocol::config::EVENT_CHANNEL_CAPACITY;
use assent_protocol::crypto::AccountKeypair;
use assent_protocol::types::{parse_u256, Address, U256};

use cli::{AssentNodeCli, Commands};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = AssentNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen => keygen(),
        Commands::SignApproval(args) => sign_approval(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Hosts the ledger: API server and metrics endpoint until shutdown.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        logging::DEFAULT_DIRECTIVES,
        LogFormat::from_str_lossy(&args.log_format),
    );

    let ledger_address: Address = args
        .ledger_address
        .parse()
        .with_context(|| format!("invalid ledger address: {}", args.ledger_address))?;
    if ledger_address.is_zero() {
        bail!("ledger address must not be the zero address");
    }

    tracing::info!(
        ledger = %ledger_address,
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        "starting assent-node"
    );

    // --- Ledger ---
    let mut token = match &args.state_file {
        Some(path) => load_ledger(path, ledger_address, &args.base_uri)?,
        None => MultiToken::new(ledger_address, args.base_uri.clone()),
    };

    for vault in &args.vaults {
        let address: Address = vault
            .parse()
            .with_context(|| format!("invalid vault address: {}", vault))?;
        token.register_receiver(address, Arc::new(TokenVault));
        tracing::info!(%address, "vault registered");
    }

    let token = Arc::new(Mutex::new(token));

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to create metrics registry")?);

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            assent_protocol::config::PROTOCOL_VERSION,
        ),
        token: Arc::clone(&token),
        event_tx,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    if let Some(path) = &args.state_file {
        let snapshot = token.lock().snapshot();
        save_snapshot(path, &snapshot)?;
        tracing::info!(
            path = %path.display(),
            balances = snapshot.balances.len(),
            "ledger state saved"
        );
    }

    tracing::info!("assent-node stopped");
    Ok(())
}

/// Loads a snapshot if `path` exists, otherwise starts an empty ledger.
/// A snapshot for a different ledger address is refused.
fn load_ledger(path: &Path, ledger_address: Address, base_uri: &str) -> Result<MultiToken> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no state file yet, starting empty");
        return Ok(MultiToken::new(ledger_address, base_uri.to_string()));
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let snapshot = LedgerSnapshot::from_json(&json)
        .with_context(|| format!("failed to parse state file {}", path.display()))?;
    if snapshot.ledger_address != ledger_address {
        bail!(
            "state file {} belongs to ledger {}, not {}",
            path.display(),
            snapshot.ledger_address,
            ledger_address
        );
    }

    let token = MultiToken::from_snapshot(&snapshot)
        .with_context(|| format!("corrupt balances in {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        balances = snapshot.balances.len(),
        "ledger state loaded"
    );
    Ok(token)
}

/// Writes via a temporary file and rename so a crash mid-write never
/// leaves a truncated snapshot behind.
fn save_snapshot(path: &Path, snapshot: &LedgerSnapshot) -> Result<()> {
    let json = snapshot.to_json().context("failed to encode ledger state")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move state file into {}", path.display()))?;
    Ok(())
}

/// Prints a fresh account key and its address.
fn keygen() -> Result<()> {
    let keypair = AccountKeypair::generate();
    println!("address    : {}", keypair.address());
    println!("secret key : 0x{}", hex::encode(keypair.secret_key_bytes()));
    Ok(())
}

/// Signs a mint approval for `args.ledger_address` and prints the
/// 65-byte signature as hex.
fn sign_approval(args: cli::SignApprovalArgs) -> Result<()> {
    let keypair = AccountKeypair::from_secret_hex(&args.secret_key).context("invalid secret key")?;
    let ledger: Address = args
        .ledger_address
        .parse()
        .with_context(|| format!("invalid ledger address: {}", args.ledger_address))?;

    let ids = parse_all(&args.ids, "id")?;
    let amounts = parse_all(&args.amounts, "amount")?;
    if ids.len() != amounts.len() {
        bail!("{} ids but {} amounts", ids.len(), amounts.len());
    }

    let approval = if ids.len() == 1 && !args.batch {
        MintApproval::single(keypair.address(), ids[0], amounts[0])
    } else {
        MintApproval::batch(keypair.address(), ids, amounts)
    };
    let signature = approval
        .sign(&ledger, &keypair)
        .context("failed to sign approval")?;

    println!("recipient : {}", keypair.address());
    println!("signature : {}", signature.to_hex());
    Ok(())
}

fn parse_all(values: &[String], what: &str) -> Result<Vec<U256>> {
    values
        .iter()
        .map(|v| parse_u256(v).with_context(|| format!("invalid {}: {}", what, v)))
        .collect()
}

/// Prints version information to stdout.
fn print_version() {
    println!("assent-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", assent_protocol::config::PROTOCOL_VERSION);
    println!("signing     {}", assent_protocol::config::SIGNING_ALGORITHM);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
