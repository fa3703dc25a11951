//! # Client Configuration & Constants
//!
//! Protocol constants that a client must agree on with the network, plus
//! the tunables a deployment may want to change ([`ClientConfig`]).
//!
//! Constants that are part of the protocol (chunk interval, window limits)
//! are not configurable: a client that disagreed with the network about
//! them would produce transactions the network rejects.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::resolver::{BackoffPolicy, RandomJitter};

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Default payload bytes per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default upper bound on the number of chunks one transaction may span.
pub const DEFAULT_MAX_CHUNKS: usize = 20;

/// Seconds between the start times of consecutive chunks.
///
/// Must stay above [`MAX_CLOCK_SKEW`]; otherwise a chunk id could collide
/// with an unrelated transaction the same payer started a moment later.
pub const CHUNK_INTERVAL_SECS: u64 = 10;

/// Largest clock difference between client and nodes the network tolerates.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Validity Window
// ---------------------------------------------------------------------------

/// How long after its start a transaction stays acceptable by default.
pub const DEFAULT_VALIDITY_WINDOW: Duration = Duration::from_secs(120);

/// The longest window nodes accept.
pub const MAX_VALIDITY_WINDOW: Duration = Duration::from_secs(180);

// ---------------------------------------------------------------------------
// Fees & Limits
// ---------------------------------------------------------------------------

/// Default fee ceiling, in photons (2 NOVA).
pub const DEFAULT_MAX_TRANSACTION_FEE: u64 = 200_000_000;

/// Longest memo the network stores, in bytes.
pub const MAX_MEMO_BYTES: usize = 100;

// ---------------------------------------------------------------------------
// Receipt Polling
// ---------------------------------------------------------------------------

/// Wait before the first receipt poll. Consensus is never instantaneous,
/// so polling right away is a guaranteed wasted call.
pub const RECEIPT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Base of the randomized exponential backoff between receipt polls.
pub const RECEIPT_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Growth factor of the receipt backoff.
pub const RECEIPT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Smallest gap between two polls, whatever the jitter draws.
pub const RECEIPT_BACKOFF_MIN: Duration = Duration::from_millis(250);

/// Largest gap between two polls.
pub const RECEIPT_BACKOFF_MAX: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Tunables for building transactions and polling receipts.
///
/// Every field has a default, so a config file only needs to mention what
/// it changes:
///
/// ```json
/// { "chunk_size": 1024, "receipt": { "max_delay_ms": 4000 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Payload bytes per chunk.
    pub chunk_size: usize,

    /// Maximum chunks per transaction.
    pub max_chunks: usize,

    /// Validity window applied to new transactions, in seconds.
    pub validity_window_secs: u64,

    /// Fee ceiling applied to new transactions, in photons.
    pub max_transaction_fee: u64,

    /// Receipt polling behaviour.
    pub receipt: ReceiptPollingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            validity_window_secs: DEFAULT_VALIDITY_WINDOW.as_secs(),
            max_transaction_fee: DEFAULT_MAX_TRANSACTION_FEE,
            receipt: ReceiptPollingConfig::default(),
        }
    }
}

/// Receipt polling knobs, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReceiptPollingConfig {
    pub initial_delay_ms: u64,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReceiptPollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: RECEIPT_INITIAL_DELAY.as_millis() as u64,
            base_delay_ms: RECEIPT_BACKOFF_BASE.as_millis() as u64,
            multiplier: RECEIPT_BACKOFF_MULTIPLIER,
            min_delay_ms: RECEIPT_BACKOFF_MIN.as_millis() as u64,
            max_delay_ms: RECEIPT_BACKOFF_MAX.as_millis() as u64,
        }
    }
}

impl ClientConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.max_chunks == 0 {
            return Err(Error::InvalidChunkConfig {
                chunk_size: self.chunk_size,
                max_chunks: self.max_chunks,
            });
        }
        if self.validity_window_secs == 0
            || self.validity_window_secs > MAX_VALIDITY_WINDOW.as_secs()
        {
            return Err(Error::InvalidConfig(format!(
                "validity_window_secs must be in 1..={}, got {}",
                MAX_VALIDITY_WINDOW.as_secs(),
                self.validity_window_secs
            )));
        }
        let receipt = &self.receipt;
        if !(receipt.multiplier.is_finite() && receipt.multiplier > 1.0) {
            return Err(Error::InvalidConfig(format!(
                "receipt.multiplier must be > 1.0, got {}",
                receipt.multiplier
            )));
        }
        if receipt.min_delay_ms == 0 {
            return Err(Error::InvalidConfig("receipt.min_delay_ms must be > 0".to_string()));
        }
        if receipt.min_delay_ms > receipt.max_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "receipt.min_delay_ms ({}) exceeds receipt.max_delay_ms ({})",
                receipt.min_delay_ms, receipt.max_delay_ms
            )));
        }
        Ok(())
    }

    pub fn validity_window(&self) -> Duration {
        Duration::from_secs(self.validity_window_secs)
    }

    /// The receipt backoff policy these settings describe, with OS-random jitter.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        let r = &self.receipt;
        BackoffPolicy {
            initial_delay: Duration::from_millis(r.initial_delay_ms),
            base_delay: Duration::from_millis(r.base_delay_ms),
            multiplier: r.multiplier,
            min_delay: Duration::from_millis(r.min_delay_ms),
            max_delay: Duration::from_millis(r.max_delay_ms),
            jitter: std::sync::Arc::new(RandomJitter),
        }
    }
}
