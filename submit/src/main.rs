// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NOVA Submit
//!
//! Entry point for the `nova-submit` binary. Parses CLI arguments,
//! initializes logging, loads the client configuration, and runs one
//! offline transaction task:
//!
//! - `plan`    — chunk layout and chunk ids for a payload length
//! - `freeze`  — build and freeze a transaction, print its bytes
//! - `sign`    — add a signature to serialized transaction bytes
//! - `decode`  — print a serialized transaction as JSON
//! - `keygen`  — generate an Ed25519 keypair
//! - `version` — print build version information

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;

use nova_client::chunk::ChunkPlan;
use nova_client::config::ClientConfig;
use nova_client::keys::Keypair;
use nova_client::{
    FrozenTransaction, LocalSigner, Signer, Timestamp, TransactionBuilder, TransactionId,
};

use cli::{Commands, NovaSubmitCli};
use logging::LogFormat;

const DEFAULT_LOG_FILTER: &str = "nova_submit=info,nova_client=warn";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = NovaSubmitCli::parse();
    logging::init_logging(DEFAULT_LOG_FILTER, LogFormat::from_str_lossy(&cli.log_format));

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan(args) => print_json(&plan_report(&args, &config)?),
        Commands::Freeze(args) => {
            println!("{}", freeze_hex(&args, &config)?);
            Ok(())
        }
        Commands::Sign(args) => {
            println!("{}", sign_hex(&args).await?);
            Ok(())
        }
        Commands::Decode(args) => print_json(&decode_report(&args.tx_hex)?),
        Commands::Keygen(args) => keygen(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::default());
    };
    let config = ClientConfig::from_file(path)
        .with_context(|| format!("failed to load client config from {}", path.display()))?;
    tracing::info!(path = %path.display(), "client config loaded");
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn start_time(start: Option<i64>) -> Timestamp {
    start.map_or_else(Timestamp::now, |secs| Timestamp::new(secs, 0))
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PlanReport {
    len: usize,
    chunk_size: usize,
    max_chunks: usize,
    chunks: usize,
    submissions: Vec<PlannedChunk>,
}

#[derive(Debug, Serialize)]
struct PlannedChunk {
    index: usize,
    transaction_id: String,
    start: usize,
    end: usize,
}

fn plan_report(args: &cli::PlanArgs, config: &ClientConfig) -> Result<PlanReport> {
    let chunk_size = args.chunk_size.unwrap_or(config.chunk_size);
    let max_chunks = args.max_chunks.unwrap_or(config.max_chunks);
    let plan = ChunkPlan::new(args.len, chunk_size, max_chunks)?;
    let base = TransactionId::new(args.payer, start_time(args.start));

    let submissions = plan
        .ranges()
        .zip(plan.transaction_ids(&base))
        .enumerate()
        .map(|(index, (range, id))| PlannedChunk {
            index,
            transaction_id: id.to_string(),
            start: range.start,
            end: range.end,
        })
        .collect();

    Ok(PlanReport {
        len: args.len,
        chunk_size,
        max_chunks,
        chunks: plan.chunk_count(),
        submissions,
    })
}

// ---------------------------------------------------------------------------
// freeze / sign
// ---------------------------------------------------------------------------

fn freeze_hex(args: &cli::FreezeArgs, config: &ClientConfig) -> Result<String> {
    let payload = match (&args.payload_hex, &args.payload_file) {
        (Some(h), _) => hex::decode(h).context("payload is not valid hex")?,
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("failed to read payload from {}", path.display()))?,
        (None, None) => Vec::new(),
    };

    let mut builder = TransactionBuilder::with_config(args.kind, config)
        .payload(payload)
        .memo(args.memo.clone())
        .node(args.node)
        .transaction_id(TransactionId::new(args.payer, start_time(args.start)));
    if let Some(max_fee) = args.max_fee {
        builder = builder.max_fee(max_fee);
    }

    let frozen = builder.freeze(&args.node, Some(args.payer))?;
    tracing::info!(
        transaction_id = %frozen.transaction_id(),
        chunks = frozen.chunk_count(),
        "transaction frozen"
    );
    Ok(hex::encode(frozen.to_bytes()?))
}

async fn sign_hex(args: &cli::SignArgs) -> Result<String> {
    let secret = std::fs::read_to_string(&args.key_file)
        .with_context(|| format!("failed to read key from {}", args.key_file.display()))?;
    let keypair = Keypair::from_hex(secret.trim()).context("key file does not hold a secret key")?;
    let signer = LocalSigner::new(keypair);

    let bytes = hex::decode(args.tx_hex.trim()).context("transaction is not valid hex")?;
    let mut frozen = FrozenTransaction::from_bytes(&bytes)?;
    frozen.sign(&signer).await?;

    tracing::info!(
        transaction_id = %frozen.transaction_id(),
        public_key = %signer.public_key(),
        "transaction signed"
    );
    Ok(hex::encode(frozen.to_bytes()?))
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DecodeReport {
    node: String,
    transaction_id: String,
    operation: String,
    validity_window_secs: u64,
    memo: String,
    max_fee: u64,
    payload_len: usize,
    hash: String,
    chunks: Vec<DecodedChunk>,
}

#[derive(Debug, Serialize)]
struct DecodedChunk {
    transaction_id: String,
    signatures: usize,
    valid_signatures: usize,
}

fn decode_report(tx_hex: &str) -> Result<DecodeReport> {
    let bytes = hex::decode(tx_hex.trim()).context("transaction is not valid hex")?;
    let frozen = FrozenTransaction::from_bytes(&bytes)?;

    let chunks = frozen
        .transaction_ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            let body = frozen.body_bytes(i).unwrap_or_default();
            let sigs = frozen.signatures(i).unwrap_or_default();
            DecodedChunk {
                transaction_id: id.to_string(),
                signatures: sigs.len(),
                valid_signatures: sigs.iter().filter(|p| p.verify(body)).count(),
            }
        })
        .collect();

    Ok(DecodeReport {
        node: frozen.node().to_string(),
        transaction_id: frozen.transaction_id().to_string(),
        operation: frozen.kind().to_string(),
        validity_window_secs: frozen.validity_window().as_secs(),
        memo: frozen.memo().to_string(),
        max_fee: frozen.max_fee(),
        payload_len: frozen.payload().len(),
        hash: hex::encode(frozen.hash()?),
        chunks,
    })
}

// ---------------------------------------------------------------------------
// keygen / version
// ---------------------------------------------------------------------------

fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let keypair = Keypair::generate();
    let public_key = keypair.public_key().to_hex();

    match args.out {
        Some(path) => {
            std::fs::write(&path, keypair.secret_key_hex())
                .with_context(|| format!("failed to write key to {}", path.display()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
            }

            tracing::info!(
                public_key = %public_key,
                key_path = %path.display(),
                "keypair generated"
            );
            println!("Public key : {}", public_key);
            println!("Secret key : {}", path.display());
        }
        None => {
            println!("Public key : {}", public_key);
            println!("Secret key : {}", keypair.secret_key_hex());
        }
    }
    Ok(())
}

fn print_version() {
    println!("nova-submit {}", env!("CARGO_PKG_VERSION"));
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
