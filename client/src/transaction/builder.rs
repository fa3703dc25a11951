//! The mutable stage of a transaction.
//!
//! [`TransactionBuilder`] collects the operation and its submission
//! parameters. Nothing here touches the network or a key; the only way
//! forward is [`TransactionBuilder::freeze`], which fixes the node, the
//! transaction id, and the exact bytes every signature will cover.

use std::time::Duration;
use tracing::debug;

use super::frozen::{FrozenChunk, FrozenTransaction};
use crate::chunk::{chunk_transaction_id, ChunkPlan};
use crate::config::{self, ClientConfig};
use crate::error::{Error, Result};
use crate::id::{EntityId, TransactionId};
use crate::network::NodeSelector;
use crate::operation::OperationKind;
use crate::wire::{self, ChunkInfo, TransactionBody};

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// A transaction that can still be changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBuilder {
    kind: OperationKind,
    payload: Vec<u8>,
    memo: String,
    max_fee: u64,
    validity_window: Duration,
    chunk_size: usize,
    max_chunks: usize,
    transaction_id: Option<TransactionId>,
    node: Option<EntityId>,
}

impl TransactionBuilder {
    /// A builder with protocol defaults.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            payload: Vec::new(),
            memo: String::new(),
            max_fee: config::DEFAULT_MAX_TRANSACTION_FEE,
            validity_window: config::DEFAULT_VALIDITY_WINDOW,
            chunk_size: config::DEFAULT_CHUNK_SIZE,
            max_chunks: config::DEFAULT_MAX_CHUNKS,
            transaction_id: None,
            node: None,
        }
    }

    /// A builder whose defaults come from `config`.
    pub fn with_config(kind: OperationKind, config: &ClientConfig) -> Self {
        Self {
            max_fee: config.max_transaction_fee,
            validity_window: config.validity_window(),
            chunk_size: config.chunk_size,
            max_chunks: config.max_chunks,
            ..Self::new(kind)
        }
    }

    /// Operation payload, as produced by the operation's own builder.
    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Fee ceiling, in photons.
    pub fn max_fee(mut self, max_fee: u64) -> Self {
        self.max_fee = max_fee;
        self
    }

    pub fn validity_window(mut self, window: Duration) -> Self {
        self.validity_window = window;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Upper bound on chunks. Ignored for kinds that cannot be chunked;
    /// those always fit in one.
    pub fn max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Uses `id` instead of generating one at freeze time.
    pub fn transaction_id(mut self, id: TransactionId) -> Self {
        self.transaction_id = Some(id);
        self
    }

    /// Addresses the transaction to `node` instead of asking the selector.
    pub fn node(mut self, node: EntityId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn payload_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn memo_str(&self) -> &str {
        &self.memo
    }

    pub fn explicit_transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    pub fn explicit_node(&self) -> Option<EntityId> {
        self.node
    }

    /// Freezes the transaction.
    ///
    /// The id is the explicit one if set, otherwise a fresh one paid by
    /// `operator`; with neither, [`Error::MissingIdentity`]. The node is the
    /// explicit one if set, otherwise whatever `selector` offers; with
    /// neither, [`Error::NoNodeAvailable`].
    pub fn freeze(
        self,
        selector: &dyn NodeSelector,
        operator: Option<EntityId>,
    ) -> Result<FrozenTransaction> {
        self.freeze_ref(selector, operator)
    }

    /// [`freeze`](Self::freeze) without consuming the builder, so a caller
    /// holding it in place keeps it when freezing fails.
    pub(crate) fn freeze_ref(
        &self,
        selector: &dyn NodeSelector,
        operator: Option<EntityId>,
    ) -> Result<FrozenTransaction> {
        if self.memo.len() > config::MAX_MEMO_BYTES {
            return Err(Error::MemoTooLong {
                len: self.memo.len(),
                max: config::MAX_MEMO_BYTES,
            });
        }
        let window_secs = self.validity_window.as_secs();
        if window_secs == 0 || self.validity_window > config::MAX_VALIDITY_WINDOW {
            return Err(Error::InvalidValidityWindow {
                secs: window_secs,
                max_secs: config::MAX_VALIDITY_WINDOW.as_secs(),
            });
        }
        if self.chunk_size == 0 || self.max_chunks == 0 {
            return Err(Error::InvalidChunkConfig {
                chunk_size: self.chunk_size,
                max_chunks: self.max_chunks,
            });
        }

        let max_chunks = if self.kind.is_chunkable() {
            self.max_chunks
        } else {
            1
        };
        let plan = ChunkPlan::new(self.payload.len(), self.chunk_size, max_chunks)?;

        let base_id = self
            .transaction_id
            .or_else(|| operator.map(TransactionId::generate))
            .ok_or(Error::MissingIdentity)?;
        let node = self
            .node
            .or_else(|| selector.select_node())
            .ok_or(Error::NoNodeAvailable)?;

        let total = plan.submissions();
        let mut chunks = Vec::with_capacity(total);
        for (index, range) in plan.ranges().enumerate() {
            let transaction_id = chunk_transaction_id(&base_id, index);
            let chunk = self.kind.is_chunkable().then(|| ChunkInfo {
                initial_transaction_id: base_id,
                number: index as u32 + 1,
                total: total as u32,
            });
            let body = TransactionBody {
                node_account_id: node,
                transaction_id,
                valid_duration_secs: window_secs,
                memo: self.memo.clone(),
                max_fee: self.max_fee,
                operation_tag: self.kind.tag(),
                operation: self.payload[range].to_vec(),
                chunk,
            };
            chunks.push(FrozenChunk {
                transaction_id,
                body_bytes: wire::encode(&body)?,
                signatures: Vec::new(),
            });
        }

        debug!(
            transaction_id = %base_id,
            %node,
            kind = %self.kind,
            chunks = total,
            payload_bytes = self.payload.len(),
            "transaction frozen"
        );

        Ok(FrozenTransaction::from_parts(
            node,
            self.kind,
            self.memo.clone(),
            self.max_fee,
            Duration::from_secs(window_secs),
            self.payload.clone(),
            chunks,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
