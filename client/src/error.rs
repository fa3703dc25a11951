//! Error types for the submission client.
//!
//! Failures fall into four families, and callers usually branch on which
//! family they got rather than on the exact variant:
//!
//! - **Construction**: the caller built or drove the transaction wrong
//!   (`MissingIdentity`, `AlreadyFrozen`, `NotFrozen`, `PayloadTooLarge`,
//!   `UnsupportedOperation`, ...). Local, synchronous, never retried.
//! - **Precheck** (`PrecheckRejected`): the node refused to admit the
//!   submission. Fix the cause (re-sign, new id) before trying again.
//! - **Consensus** (`ConsensusFailure`): the network processed the
//!   transaction and the outcome is a failure. Final.
//! - **Timeout** (`ConsensusTimeout`): the validity window closed while the
//!   outcome was still pending. The result is unknown, not negative.
//!
//! Status-bearing variants render as `NAME (code)` so a log line is enough
//! to diagnose them.

use thiserror::Error;

use crate::id::{EntityId, Timestamp, TransactionId};
use crate::signer::SignerError;
use crate::status::Status;
use crate::transaction::ChunkOutcome;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building, submitting, or resolving a transaction.
#[derive(Debug, Error)]
pub enum Error {
    /// Neither an explicit transaction id nor an operator account to derive
    /// one from was available at freeze time.
    #[error("transaction has no identity: set a transaction id or supply an operator account")]
    MissingIdentity,

    /// `freeze` (or a setter) was called on a transaction that is already frozen.
    #[error("transaction is already frozen")]
    AlreadyFrozen,

    /// `sign` or `execute` was called before the transaction was frozen.
    #[error("transaction is not frozen")]
    NotFrozen,

    /// No explicit node was set and the node selector offered none.
    #[error("no node available to receive the transaction")]
    NoNodeAvailable,

    /// The payload would need more chunks than the operation allows.
    #[error("payload needs {chunks} chunks but at most {max_chunks} are allowed")]
    PayloadTooLarge { chunks: usize, max_chunks: usize },

    /// Chunk size or chunk limit is zero.
    #[error("invalid chunk configuration: chunk_size={chunk_size}, max_chunks={max_chunks}")]
    InvalidChunkConfig { chunk_size: usize, max_chunks: usize },

    /// A decoded body carries an operation tag this client does not know.
    #[error("unsupported operation tag {tag}")]
    UnsupportedOperation { tag: u16 },

    /// The memo exceeds what the network stores.
    #[error("memo is {len} bytes, at most {max} are allowed")]
    MemoTooLong { len: usize, max: usize },

    /// The validity window is zero or longer than nodes accept.
    #[error("validity window of {secs}s is outside 1..={max_secs}s")]
    InvalidValidityWindow { secs: u64, max_secs: u64 },

    /// Every chunk of the transaction has already been submitted.
    #[error("all {total} chunk(s) have already been submitted")]
    ChunksExhausted { total: usize },

    /// A later chunk was submitted before the previous one was confirmed.
    #[error("chunk {index} cannot be submitted before chunk {pending} is confirmed")]
    UnconfirmedChunk { index: usize, pending: usize },

    /// The node refused to admit the submission.
    #[error("transaction {transaction_id} rejected at precheck: {status}")]
    PrecheckRejected {
        status: Status,
        transaction_id: TransactionId,
    },

    /// Consensus was reached and the outcome is a failure.
    #[error("transaction {transaction_id} failed with status {status}")]
    ConsensusFailure {
        status: Status,
        transaction_id: TransactionId,
    },

    /// The validity window elapsed while the outcome was still pending.
    #[error("transaction {transaction_id} still pending at deadline {deadline}")]
    ConsensusTimeout {
        transaction_id: TransactionId,
        deadline: Timestamp,
    },

    /// The signer could not produce a signature.
    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    /// The channel provider failed to carry a call.
    #[error("network error: {0}")]
    Network(String),

    /// The channel provider has no endpoint for this node.
    #[error("node {0} is not known to the network")]
    UnknownNode(EntityId),

    /// Decoded bytes are well-formed but do not describe one transaction
    /// (no chunks, chunks addressed to different nodes, ...).
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// Wire encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("invalid entity id: {0:?}")]
    InvalidEntityId(String),

    #[error("invalid transaction id: {0:?}")]
    InvalidTransactionId(String),

    /// Configuration values are out of range or could not be loaded.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// The node status behind this error, if there is one.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::PrecheckRejected { status, .. } | Self::ConsensusFailure { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// `true` for errors caused by how the transaction was built or driven.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::MissingIdentity
                | Self::AlreadyFrozen
                | Self::NotFrozen
                | Self::NoNodeAvailable
                | Self::PayloadTooLarge { .. }
                | Self::InvalidChunkConfig { .. }
                | Self::MemoTooLong { .. }
                | Self::InvalidValidityWindow { .. }
                | Self::UnsupportedOperation { .. }
                | Self::ChunksExhausted { .. }
                | Self::UnconfirmedChunk { .. }
        )
    }
}

/// A chunked execution that stopped part way.
///
/// `completed` holds the outcomes of every chunk that was confirmed before
/// `error` occurred. Those chunks have reached consensus and stay applied.
#[derive(Debug, Error)]
#[error("chunked execution stopped after {} confirmed chunk(s): {error}", .completed.len())]
pub struct PartialExecution {
    pub completed: Vec<ChunkOutcome>,
    #[source]
    pub error: Error,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_id() -> TransactionId {
        TransactionId::new(EntityId::from_num(1001), Timestamp::new(1_700_000_000, 0))
    }

    #[test]
    fn precheck_error_names_status() {
        let err = Error::PrecheckRejected {
            status: Status::InvalidSignature,
            transaction_id: sample_id(),
        };
        let msg = err.to_string();
        assert!(msg.contains("INVALID_SIGNATURE (7)"), "{}", msg);
        assert!(msg.contains("0.0.1001@1700000000.000000000"), "{}", msg);
        assert_eq!(err.status(), Some(Status::InvalidSignature));
    }

    #[test]
    fn timeout_has_no_status() {
        let err = Error::ConsensusTimeout {
            transaction_id: sample_id(),
            deadline: Timestamp::new(1_700_000_120, 0),
        };
        assert_eq!(err.status(), None);
        assert!(!err.is_construction());
    }

    #[test]
    fn construction_family() {
        assert!(Error::AlreadyFrozen.is_construction());
        assert!(Error::PayloadTooLarge {
            chunks: 21,
            max_chunks: 20
        }
        .is_construction());
        assert!(!Error::Network("reset".into()).is_construction());
    }

    #[test]
    fn partial_execution_message() {
        let err = PartialExecution {
            completed: Vec::new(),
            error: Error::NotFrozen,
        };
        assert_eq!(
            err.to_string(),
            "chunked execution stopped after 0 confirmed chunk(s): transaction is not frozen"
        );
    }
}
