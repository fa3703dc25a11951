//! What a submission hands back.

use std::time::Duration;

use crate::error::Result;
use crate::id::{EntityId, TransactionId};
use crate::receipt::Receipt;
use crate::resolver::OutcomeResolver;

/// Proof that a node admitted one chunk for consensus.
///
/// Admission is not an outcome. The outcome comes from
/// [`get_receipt`](Self::get_receipt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    pub node: EntityId,
    pub transaction_id: TransactionId,
    /// Position of the chunk within its transaction, 0-based.
    pub chunk_index: usize,
    /// SHA-384 of the signed bytes that were sent.
    pub hash: Vec<u8>,
}

impl TransactionResponse {
    pub fn hash_hex(&self) -> String {
        hex::encode(&self.hash)
    }

    /// Polls for this chunk's outcome until it is final or the chunk's
    /// validity window closes.
    ///
    /// Read-only: it does not mark anything confirmed on the transaction.
    pub async fn get_receipt(
        &self,
        resolver: &OutcomeResolver,
        validity_window: Duration,
    ) -> Result<Receipt> {
        let deadline = self.transaction_id.deadline(validity_window);
        resolver.resolve(&self.transaction_id, deadline).await
    }
}

/// A confirmed chunk: the admission and the successful receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub response: TransactionResponse,
    pub receipt: Receipt,
}
