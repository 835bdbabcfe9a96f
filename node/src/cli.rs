//! # CLI Interface
//!
//! Defines the command-line argument structure for `assent-node` using
//! `clap` derive. Subcommands: `run`, `keygen`, `sign-approval` and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use assent_protocol::config::{DEFAULT_BASE_URI, DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};

/// Assent multi-token ledger node.
///
/// Hosts one consent-gated ledger, serves the JSON-RPC and REST API,
/// streams ledger events over WebSocket and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "assent-node",
    about = "Assent multi-token ledger node",
    version,
    propagate_version = true
)]
pub struct AssentNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Assent node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the ledger node.
    Run(RunArgs),
    /// Generate a fresh secp256k1 account key and print its address.
    Keygen,
    /// Sign a mint approval for a ledger with a recipient's key.
    SignApproval(SignApprovalArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Hex address identifying this ledger. Bound into every approval
    /// digest, so approvals signed for another ledger are refused.
    #[arg(long, env = "ASSENT_LEDGER_ADDRESS")]
    pub ledger_address: String,

    /// Metadata base URI. `{id}` is replaced with the 64-digit hex token id.
    #[arg(long, env = "ASSENT_BASE_URI", default_value = DEFAULT_BASE_URI)]
    pub base_uri: String,

    /// Port for the JSON-RPC and REST API.
    #[arg(long, env = "ASSENT_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "ASSENT_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "ASSENT_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// JSON snapshot to load at startup and write on shutdown.
    ///
    /// A missing file starts an empty ledger.
    #[arg(long, env = "ASSENT_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Addresses to register as accept-everything vaults. Repeatable, or
    /// comma-separated in the environment variable.
    #[arg(long = "vault", env = "ASSENT_VAULTS", value_delimiter = ',')]
    pub vaults: Vec<String>,
}

/// Arguments for the `sign-approval` subcommand.
#[derive(Parser, Debug)]
pub struct SignApprovalArgs {
    /// Hex secp256k1 secret key of the recipient.
    ///
    /// **Never pass this flag on a shared machine**; prefer the env var.
    #[arg(long, env = "ASSENT_SECRET_KEY")]
    pub secret_key: String,

    /// Hex address of the ledger the approval is for.
    #[arg(long, env = "ASSENT_LEDGER_ADDRESS")]
    pub ledger_address: String,

    /// Token id (decimal or `0x` hex). Repeat for a batch approval.
    #[arg(long = "id", required = true)]
    pub ids: Vec<String>,

    /// Amount (decimal or `0x` hex), one per `--id`.
    #[arg(long = "amount", required = true)]
    pub amounts: Vec<String>,

    /// Sign a batch approval even for a single pair.
    #[arg(long)]
    pub batch: bool,
}
