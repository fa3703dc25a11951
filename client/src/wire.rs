//! Wire envelope.
//!
//! Everything that crosses the network is a serde type encoded with
//! bincode's default options (fixed-width integers, little-endian). The
//! encoding is deterministic, so the body bytes a signer sees are exactly
//! the bytes a node will verify against.
//!
//! ```text
//! TransactionList
//!   └─ SignedTransaction*        one per chunk
//!        ├─ body_bytes           bincode(TransactionBody)
//!        └─ sig_map              SignaturePair*
//! ```
//!
//! Bodies travel as opaque bytes inside `SignedTransaction` rather than as
//! a nested struct. Re-encoding a decoded body is never needed, and keeping
//! the original bytes avoids any chance of a signature covering something
//! other than what is sent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::id::{EntityId, TransactionId};
use crate::signer::SignaturePair;
use crate::status::Status;

/// Serializes `value` into its wire form.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

/// Parses a wire message.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

/// Position of one chunk within a chunked transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    /// Id of the first chunk; ties the chunks together on the node side.
    pub initial_transaction_id: TransactionId,
    /// 1-based.
    pub number: u32,
    pub total: u32,
}

/// The signed content of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    /// The node this body is addressed to. A node rejects bodies naming
    /// another node.
    pub node_account_id: EntityId,
    pub transaction_id: TransactionId,
    pub valid_duration_secs: u64,
    pub memo: String,
    pub max_fee: u64,
    /// [`OperationKind`](crate::operation::OperationKind) tag.
    pub operation_tag: u16,
    /// Opaque operation payload (or this chunk's slice of it).
    pub operation: Vec<u8>,
    pub chunk: Option<ChunkInfo>,
}

/// Body bytes plus every signature collected over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub body_bytes: Vec<u8>,
    pub sig_map: Vec<SignaturePair>,
}

/// Serialized form of a whole frozen transaction, one entry per chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionList {
    pub transactions: Vec<SignedTransaction>,
}

/// A node's immediate answer to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecheckResponse {
    pub status: Status,
    /// Fee estimate, when the node reports one.
    pub cost: u64,
}

/// Request body for a receipt lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptQuery {
    pub transaction_id: TransactionId,
}
