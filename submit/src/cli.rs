//! # CLI Interface
//!
//! Defines the command-line argument structure for `nova-submit` using
//! `clap` derive. Subcommands: `plan`, `freeze`, `sign`, `decode`,
//! `keygen`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use nova_client::{EntityId, OperationKind};

/// NOVA transaction tool.
///
/// Plans chunking for a payload, freezes and signs transactions offline,
/// and decodes serialized transactions for inspection. Nothing here talks
/// to a node; the output of `freeze`/`sign` is handed to whatever submits.
#[derive(Parser, Debug)]
#[command(
    name = "nova-submit",
    about = "NOVA transaction tool",
    version,
    propagate_version = true
)]
pub struct NovaSubmitCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "NOVA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Path to a JSON client configuration file.
    ///
    /// When omitted, built-in defaults apply.
    #[arg(long, short = 'c', global = true, env = "NOVA_CLIENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how a payload of a given length splits into chunks.
    Plan(PlanArgs),
    /// Build and freeze a transaction; prints its bytes as hex.
    Freeze(FreezeArgs),
    /// Add a signature to a serialized transaction; prints the new hex.
    Sign(SignArgs),
    /// Decode a serialized transaction and print it as JSON.
    Decode(DecodeArgs),
    /// Generate a fresh Ed25519 keypair.
    Keygen(KeygenArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `plan` subcommand.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Payload length in bytes.
    #[arg(long)]
    pub len: usize,

    /// Bytes per chunk. Defaults to the configured chunk size.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Chunk limit. Defaults to the configured limit.
    #[arg(long)]
    pub max_chunks: Option<usize>,

    /// Paying account, `shard.realm.num`.
    #[arg(long, value_parser = parse_entity_id)]
    pub payer: EntityId,

    /// Valid-start of the first chunk, in Unix seconds. Defaults to now.
    #[arg(long)]
    pub start: Option<i64>,
}

/// Arguments for the `freeze` subcommand.
#[derive(Args, Debug)]
pub struct FreezeArgs {
    /// Operation kind, e.g. `FileAppend` (case-insensitive).
    #[arg(long, value_parser = parse_operation_kind)]
    pub kind: OperationKind,

    /// Operation payload, hex-encoded.
    #[arg(long, conflicts_with = "payload_file")]
    pub payload_hex: Option<String>,

    /// File whose raw contents are the operation payload.
    #[arg(long)]
    pub payload_file: Option<PathBuf>,

    /// Paying account, `shard.realm.num`.
    #[arg(long, value_parser = parse_entity_id)]
    pub payer: EntityId,

    /// Node the transaction is addressed to.
    #[arg(long, value_parser = parse_entity_id)]
    pub node: EntityId,

    /// Valid-start in Unix seconds. Defaults to now.
    #[arg(long)]
    pub start: Option<i64>,

    #[arg(long, default_value = "")]
    pub memo: String,

    /// Fee ceiling in photons. Defaults to the configured ceiling.
    #[arg(long)]
    pub max_fee: Option<u64>,
}

/// Arguments for the `sign` subcommand.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Serialized transaction, hex-encoded.
    #[arg(long = "hex")]
    pub tx_hex: String,

    /// File holding the hex-encoded 32-byte secret key.
    #[arg(long, env = "NOVA_SIGNING_KEY_FILE")]
    pub key_file: PathBuf,
}

/// Arguments for the `decode` subcommand.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Serialized transaction, hex-encoded.
    #[arg(long = "hex")]
    pub tx_hex: String,
}

/// Arguments for the `keygen` subcommand.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Write the secret key here (mode 0600) instead of printing it.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_entity_id(s: &str) -> Result<EntityId, String> {
    s.parse().map_err(|e: nova_client::Error| e.to_string())
}

pub fn parse_operation_kind(s: &str) -> Result<OperationKind, String> {
    OperationKind::ALL
        .iter()
        .copied()
        .find(|kind| kind.to_string().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown operation kind {:?}", s))
}
