//! The immutable stage of a transaction.
//!
//! A [`FrozenTransaction`] owns one encoded body per chunk. Those bytes
//! never change again. Signing appends signature pairs, and execution moves
//! a cursor over the chunks:
//!
//! ```text
//!  chunk:      0          1          2
//!           confirmed  submitted  pending
//!                          ▲          ▲
//!                      confirmed    cursor
//! ```
//!
//! Chunk `i + 1` is only submitted once chunk `i` has been confirmed through
//! [`FrozenTransaction::confirm`], because nodes reassemble chunks in
//! consensus order and a later chunk reaching consensus first would corrupt
//! the result.

use sha2::{Digest, Sha384};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::response::{ChunkOutcome, TransactionResponse};
use crate::chunk::chunk_transaction_id;
use crate::config;
use crate::dispatch::Dispatcher;
use crate::error::{Error, PartialExecution, Result};
use crate::id::{EntityId, TransactionId};
use crate::operation::OperationKind;
use crate::receipt::Receipt;
use crate::resolver::OutcomeResolver;
use crate::signer::{sign_pair, SignaturePair, Signer};
use crate::wire::{self, SignedTransaction, TransactionBody, TransactionList};

/// One chunk's id, body bytes, and the signatures collected over them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FrozenChunk {
    pub(crate) transaction_id: TransactionId,
    pub(crate) body_bytes: Vec<u8>,
    pub(crate) signatures: Vec<SignaturePair>,
}

impl FrozenChunk {
    fn signed(&self) -> SignedTransaction {
        SignedTransaction {
            body_bytes: self.body_bytes.clone(),
            sig_map: self.signatures.clone(),
        }
    }
}

/// A transaction whose bodies are fixed. Only signatures may be added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenTransaction {
    node: EntityId,
    kind: OperationKind,
    memo: String,
    max_fee: u64,
    validity_window: Duration,
    payload: Vec<u8>,
    chunks: Vec<FrozenChunk>,
    /// Next chunk to submit.
    cursor: usize,
    /// Chunks `0..confirmed` have a successful receipt.
    confirmed: usize,
}

impl FrozenTransaction {
    pub(crate) fn from_parts(
        node: EntityId,
        kind: OperationKind,
        memo: String,
        max_fee: u64,
        validity_window: Duration,
        payload: Vec<u8>,
        chunks: Vec<FrozenChunk>,
    ) -> Self {
        Self {
            node,
            kind,
            memo,
            max_fee,
            validity_window,
            payload,
            chunks,
            cursor: 0,
            confirmed: 0,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn node(&self) -> EntityId {
        self.node
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn max_fee(&self) -> u64 {
        self.max_fee
    }

    pub fn validity_window(&self) -> Duration {
        self.validity_window
    }

    /// The full operation payload, across all chunks.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The assigned id, which is also the first chunk's id.
    pub fn transaction_id(&self) -> TransactionId {
        self.chunks[0].transaction_id
    }

    /// Ids of every chunk, in submission order.
    pub fn transaction_ids(&self) -> Vec<TransactionId> {
        self.chunks.iter().map(|c| c.transaction_id).collect()
    }

    /// Number of submissions this transaction makes.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Encoded body of chunk `index`, exactly as signers see it.
    pub fn body_bytes(&self, index: usize) -> Option<&[u8]> {
        self.chunks.get(index).map(|c| c.body_bytes.as_slice())
    }

    /// Signatures collected for chunk `index`.
    pub fn signatures(&self, index: usize) -> Option<&[SignaturePair]> {
        self.chunks.get(index).map(|c| c.signatures.as_slice())
    }

    /// Index of the next chunk [`execute`](Self::execute) will submit.
    pub fn next_chunk(&self) -> usize {
        self.cursor
    }

    pub fn confirmed_chunks(&self) -> usize {
        self.confirmed
    }

    /// `true` once every chunk has been submitted.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.chunks.len()
    }

    /// SHA-384 of the first chunk's signed bytes, the hash nodes index
    /// the transaction under. Changes as signatures are added.
    pub fn hash(&self) -> Result<Vec<u8>> {
        let bytes = wire::encode(&self.chunks[0].signed())?;
        Ok(Sha384::digest(&bytes).to_vec())
    }

    // -- signing ------------------------------------------------------------

    /// Signs every chunk body with `signer` and appends the pairs.
    ///
    /// Either every chunk gains a signature or none does. Signing twice with
    /// the same key adds a second pair; nothing is deduplicated.
    pub async fn sign(&mut self, signer: &dyn Signer) -> Result<&mut Self> {
        let mut pairs = Vec::with_capacity(self.chunks.len());
        for chunk in &self.chunks {
            pairs.push(sign_pair(signer, &chunk.body_bytes).await?);
        }
        for (chunk, pair) in self.chunks.iter_mut().zip(pairs) {
            chunk.signatures.push(pair);
        }
        debug!(
            transaction_id = %self.transaction_id(),
            public_key = %signer.public_key(),
            chunks = self.chunks.len(),
            "transaction signed"
        );
        Ok(self)
    }

    // -- execution ----------------------------------------------------------

    /// Submits the chunk at the cursor.
    ///
    /// The cursor only advances when the node admits the chunk, so a
    /// rejected chunk can be resubmitted. Fails with
    /// [`Error::ChunksExhausted`] once every chunk went out, and with
    /// [`Error::UnconfirmedChunk`] while the previous chunk still lacks a
    /// confirmed receipt.
    pub async fn execute(&mut self, dispatcher: &Dispatcher) -> Result<TransactionResponse> {
        let index = self.cursor;
        if index >= self.chunks.len() {
            return Err(Error::ChunksExhausted {
                total: self.chunks.len(),
            });
        }
        if index > self.confirmed {
            return Err(Error::UnconfirmedChunk {
                index,
                pending: self.confirmed,
            });
        }

        let chunk = &self.chunks[index];
        let request = wire::encode(&chunk.signed())?;
        let hash = Sha384::digest(&request).to_vec();
        let transaction_id = chunk.transaction_id;

        dispatcher
            .send(&self.node, &transaction_id, self.kind.dispatch_method(), request)
            .await?;

        self.cursor += 1;
        Ok(TransactionResponse {
            node: self.node,
            transaction_id,
            chunk_index: index,
            hash,
        })
    }

    /// Waits for the receipt of a submitted chunk and records it as
    /// confirmed when it succeeds.
    ///
    /// Confirming an already confirmed chunk just looks the receipt up
    /// again.
    pub async fn confirm(
        &mut self,
        response: &TransactionResponse,
        resolver: &OutcomeResolver,
    ) -> Result<Receipt> {
        let index = response.chunk_index;
        let belongs = self
            .chunks
            .get(index)
            .is_some_and(|c| c.transaction_id == response.transaction_id);
        if !belongs || index >= self.cursor {
            return Err(Error::MalformedTransaction(format!(
                "response for {} (chunk {}) does not match a submitted chunk",
                response.transaction_id, index
            )));
        }
        if index > self.confirmed {
            return Err(Error::UnconfirmedChunk {
                index,
                pending: self.confirmed,
            });
        }

        let receipt = response.get_receipt(resolver, self.validity_window).await?;
        if index == self.confirmed {
            self.confirmed += 1;
        }
        Ok(receipt)
    }

    /// Submits and confirms every remaining chunk in order.
    ///
    /// Stops at the first failure and returns the outcomes of the chunks
    /// confirmed so far alongside the error. Chunks after the failing one
    /// are never dispatched.
    pub async fn execute_all(
        &mut self,
        dispatcher: &Dispatcher,
        resolver: &OutcomeResolver,
    ) -> std::result::Result<Vec<ChunkOutcome>, PartialExecution> {
        let mut completed = Vec::new();
        if self.is_exhausted() {
            return Err(PartialExecution {
                completed,
                error: Error::ChunksExhausted {
                    total: self.chunks.len(),
                },
            });
        }

        info!(
            transaction_id = %self.transaction_id(),
            kind = %self.kind,
            chunks = self.chunks.len(),
            from_chunk = self.cursor,
            "executing transaction"
        );

        while !self.is_exhausted() {
            let response = match self.execute(dispatcher).await {
                Ok(response) => response,
                Err(error) => return Err(self.stopped(completed, error)),
            };
            let receipt = match self.confirm(&response, resolver).await {
                Ok(receipt) => receipt,
                Err(error) => return Err(self.stopped(completed, error)),
            };
            completed.push(ChunkOutcome { response, receipt });
        }

        info!(
            transaction_id = %self.transaction_id(),
            chunks = completed.len(),
            "transaction executed"
        );
        Ok(completed)
    }

    fn stopped(&self, completed: Vec<ChunkOutcome>, error: Error) -> PartialExecution {
        warn!(
            transaction_id = %self.transaction_id(),
            confirmed = completed.len(),
            chunk = self.cursor,
            error = %error,
            "chunked execution stopped"
        );
        PartialExecution { completed, error }
    }

    // -- serialization ------------------------------------------------------

    /// Encodes every chunk with its signatures.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        wire::encode(&TransactionList {
            transactions: self.chunks.iter().map(FrozenChunk::signed).collect(),
        })
    }

    /// Restores a transaction from [`to_bytes`](Self::to_bytes) output.
    ///
    /// Body bytes are kept verbatim, so existing signatures stay valid. The
    /// restored transaction starts with nothing submitted. The bodies must
    /// describe a transaction [`freeze`](super::TransactionBuilder::freeze)
    /// could have produced: one node, one operation, chunk ids and chunk
    /// numbers in submission order, and a validity window within bounds.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let list: TransactionList = wire::decode(bytes)?;
        let total = list.transactions.len();
        let mut signed = list.transactions.into_iter();
        let first = signed
            .next()
            .ok_or_else(|| Error::MalformedTransaction("no chunks".to_string()))?;

        let head: TransactionBody = wire::decode(&first.body_bytes)?;
        let kind = OperationKind::from_tag(head.operation_tag)?;
        let window = Duration::from_secs(head.valid_duration_secs);
        if head.valid_duration_secs == 0 || window > config::MAX_VALIDITY_WINDOW {
            return Err(Error::InvalidValidityWindow {
                secs: head.valid_duration_secs,
                max_secs: config::MAX_VALIDITY_WINDOW.as_secs(),
            });
        }
        if head.memo.len() > config::MAX_MEMO_BYTES {
            return Err(Error::MemoTooLong {
                len: head.memo.len(),
                max: config::MAX_MEMO_BYTES,
            });
        }
        if total > 1 && !kind.is_chunkable() {
            return Err(Error::MalformedTransaction(format!(
                "{} cannot be split, found {} chunks",
                kind, total
            )));
        }

        let base_id = head.transaction_id;
        check_chunk(&head, &head, 0, total, kind)?;
        let mut payload = head.operation.clone();
        let mut chunks = vec![FrozenChunk {
            transaction_id: base_id,
            body_bytes: first.body_bytes,
            signatures: first.sig_map,
        }];

        for (offset, entry) in signed.enumerate() {
            let index = offset + 1;
            let body: TransactionBody = wire::decode(&entry.body_bytes)?;
            check_chunk(&head, &body, index, total, kind)?;
            payload.extend_from_slice(&body.operation);
            chunks.push(FrozenChunk {
                transaction_id: body.transaction_id,
                body_bytes: entry.body_bytes,
                signatures: entry.sig_map,
            });
        }

        Ok(Self::from_parts(
            head.node_account_id,
            kind,
            head.memo,
            head.max_fee,
            window,
            payload,
            chunks,
        ))
    }
}

/// Checks that `body` is chunk `index` of `total` of the transaction whose
/// first body is `head`.
fn check_chunk(
    head: &TransactionBody,
    body: &TransactionBody,
    index: usize,
    total: usize,
    kind: OperationKind,
) -> Result<()> {
    let malformed =
        |what: String| Err(Error::MalformedTransaction(format!("chunk {}: {}", index, what)));

    if body.node_account_id != head.node_account_id {
        return malformed(format!(
            "addressed to {}, chunk 0 to {}",
            body.node_account_id, head.node_account_id
        ));
    }
    if body.operation_tag != head.operation_tag {
        return malformed(format!(
            "operation tag {}, chunk 0 tag {}",
            body.operation_tag, head.operation_tag
        ));
    }
    if body.valid_duration_secs != head.valid_duration_secs
        || body.memo != head.memo
        || body.max_fee != head.max_fee
    {
        return malformed("window, memo or fee differs from chunk 0".to_string());
    }

    let expected_id = chunk_transaction_id(&head.transaction_id, index);
    if body.transaction_id != expected_id {
        return malformed(format!("id {}, expected {}", body.transaction_id, expected_id));
    }

    match (&body.chunk, kind.is_chunkable()) {
        (None, false) => Ok(()),
        (Some(info), true)
            if info.initial_transaction_id == head.transaction_id
                && info.number as usize == index + 1
                && info.total as usize == total =>
        {
            Ok(())
        }
        (Some(info), true) => malformed(format!(
            "numbered {} of {} from {}, expected {} of {} from {}",
            info.number,
            info.total,
            info.initial_transaction_id,
            index + 1,
            total,
            head.transaction_id
        )),
        (None, true) => malformed("missing chunk info".to_string()),
        (Some(_), false) => malformed(format!("{} carries chunk info", kind)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Timestamp;
    use crate::keys::Keypair;
    use crate::signer::{ExternalSigner, LocalSigner, SignerError};
    use crate::transaction::TransactionBuilder;

    const NODE: EntityId = EntityId::new(0, 0, 3);

    fn chunked(len: usize) -> FrozenTransaction {
        TransactionBuilder::new(OperationKind::FileAppend)
            .payload((0..len).map(|i| i as u8).collect())
            .chunk_size(100)
            .memo("append")
            .transaction_id(TransactionId::new(
                EntityId::from_num(1001),
                Timestamp::new(1_700_000_000, 123),
            ))
            .freeze(&NODE, None)
            .unwrap()
    }

    #[tokio::test]
    async fn sign_covers_every_chunk() {
        let mut tx = chunked(250);
        let signer = LocalSigner::generate();
        tx.sign(&signer).await.unwrap();

        for i in 0..tx.chunk_count() {
            let sigs = tx.signatures(i).unwrap();
            assert_eq!(sigs.len(), 1);
            assert!(sigs[0].verify(tx.body_bytes(i).unwrap()));
        }
    }

    #[tokio::test]
    async fn signatures_accumulate_and_bodies_stay_fixed() {
        let mut tx = chunked(150);
        let bodies: Vec<Vec<u8>> = (0..tx.chunk_count())
            .map(|i| tx.body_bytes(i).unwrap().to_vec())
            .collect();
        let signer = LocalSigner::generate();

        tx.sign(&signer).await.unwrap();
        tx.sign(&signer).await.unwrap();
        tx.sign(&LocalSigner::generate()).await.unwrap();

        for (i, body) in bodies.iter().enumerate() {
            assert_eq!(tx.body_bytes(i).unwrap(), body.as_slice());
            assert_eq!(tx.signatures(i).unwrap().len(), 3);
        }
    }

    #[tokio::test]
    async fn failing_signer_leaves_no_partial_signatures() {
        let mut tx = chunked(250);
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let keypair = Keypair::generate();
        let counter = calls.clone();
        let signer = ExternalSigner::new(keypair.public_key(), move |message| {
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let keypair = keypair.clone();
            async move {
                if n == 1 {
                    Err(SignerError::Rejected("user declined".into()))
                } else {
                    Ok(keypair.sign(&message))
                }
            }
        });

        let err = tx.sign(&signer).await.unwrap_err();
        assert!(matches!(err, Error::Signer(SignerError::Rejected(_))));
        for i in 0..tx.chunk_count() {
            assert!(tx.signatures(i).unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn bytes_roundtrip_preserves_identity() {
        let mut tx = chunked(250);
        tx.sign(&LocalSigner::generate()).await.unwrap();

        let restored = FrozenTransaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.node(), tx.node());
        assert_eq!(restored.transaction_id(), tx.transaction_id());
        assert_eq!(restored.transaction_ids(), tx.transaction_ids());
        assert_eq!(restored.validity_window(), tx.validity_window());
        assert_eq!(restored.kind(), OperationKind::FileAppend);
        assert_eq!(restored.memo(), "append");
        assert_eq!(restored.payload(), tx.payload());
        assert_eq!(restored.signatures(2), tx.signatures(2));
        assert_eq!(restored.hash().unwrap(), tx.hash().unwrap());
    }

    #[test]
    fn from_bytes_rejects_unknown_operation() {
        let tx = chunked(10);
        let mut list: TransactionList = wire::decode(&tx.to_bytes().unwrap()).unwrap();
        let mut body: TransactionBody = wire::decode(&list.transactions[0].body_bytes).unwrap();
        body.operation_tag = 999;
        list.transactions[0].body_bytes = wire::encode(&body).unwrap();

        let err = FrozenTransaction::from_bytes(&wire::encode(&list).unwrap()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { tag: 999 }));
    }

    #[test]
    fn from_bytes_rejects_empty_and_mixed_lists() {
        let empty = wire::encode(&TransactionList {
            transactions: Vec::new(),
        })
        .unwrap();
        assert!(matches!(
            FrozenTransaction::from_bytes(&empty),
            Err(Error::MalformedTransaction(_))
        ));

        let tx = chunked(150);
        let mut list: TransactionList = wire::decode(&tx.to_bytes().unwrap()).unwrap();
        let mut body: TransactionBody = wire::decode(&list.transactions[1].body_bytes).unwrap();
        body.node_account_id = EntityId::from_num(4);
        list.transactions[1].body_bytes = wire::encode(&body).unwrap();
        assert!(matches!(
            FrozenTransaction::from_bytes(&wire::encode(&list).unwrap()),
            Err(Error::MalformedTransaction(_))
        ));
    }

    /// Re-encodes `tx` after applying `edit` to each chunk body.
    fn reencoded(
        tx: &FrozenTransaction,
        edit: impl Fn(usize, &mut TransactionBody),
    ) -> TransactionList {
        let mut list: TransactionList = wire::decode(&tx.to_bytes().unwrap()).unwrap();
        for (i, entry) in list.transactions.iter_mut().enumerate() {
            let mut body: TransactionBody = wire::decode(&entry.body_bytes).unwrap();
            edit(i, &mut body);
            entry.body_bytes = wire::encode(&body).unwrap();
        }
        list
    }

    fn restore(list: &TransactionList) -> Result<FrozenTransaction> {
        FrozenTransaction::from_bytes(&wire::encode(list).unwrap())
    }

    #[test]
    fn from_bytes_rejects_out_of_range_window() {
        let tx = chunked(250);
        for secs in [0, 100_000, u64::MAX] {
            let list = reencoded(&tx, |_, body| body.valid_duration_secs = secs);
            let err = restore(&list).unwrap_err();
            assert!(
                matches!(err, Error::InvalidValidityWindow { secs: s, .. } if s == secs),
                "window {} gave {:?}",
                secs,
                err
            );
        }
    }

    #[test]
    fn from_bytes_rejects_reordered_chunks() {
        let tx = chunked(250);
        let mut list = reencoded(&tx, |_, _| {});
        list.transactions.swap(0, 2);
        assert!(matches!(restore(&list), Err(Error::MalformedTransaction(_))));

        let mut list = reencoded(&tx, |_, _| {});
        list.transactions.swap(1, 2);
        assert!(matches!(restore(&list), Err(Error::MalformedTransaction(_))));
    }

    #[test]
    fn from_bytes_rejects_inconsistent_chunk_info() {
        let tx = chunked(250);

        let renumbered = reencoded(&tx, |i, body| {
            if i == 1 {
                body.chunk.as_mut().unwrap().number = 3;
            }
        });
        assert!(matches!(restore(&renumbered), Err(Error::MalformedTransaction(_))));

        let short_total = reencoded(&tx, |_, body| body.chunk.as_mut().unwrap().total = 2);
        assert!(matches!(restore(&short_total), Err(Error::MalformedTransaction(_))));

        let shifted_id = reencoded(&tx, |i, body| {
            if i == 2 {
                body.transaction_id = body.transaction_id.offset_seconds(1);
            }
        });
        assert!(matches!(restore(&shifted_id), Err(Error::MalformedTransaction(_))));

        let stripped = reencoded(&tx, |_, body| body.chunk = None);
        assert!(matches!(restore(&stripped), Err(Error::MalformedTransaction(_))));
    }

    #[test]
    fn from_bytes_rejects_split_unchunkable_operation() {
        let tx = chunked(250);
        let list = reencoded(&tx, |_, body| {
            body.operation_tag = OperationKind::CryptoTransfer.tag();
        });
        assert!(matches!(restore(&list), Err(Error::MalformedTransaction(_))));
    }

    #[test]
    fn from_bytes_accepts_untouched_reencoding() {
        let tx = chunked(250);
        let restored = restore(&reencoded(&tx, |_, _| {})).unwrap();
        assert_eq!(restored.transaction_ids(), tx.transaction_ids());
        assert_eq!(restored.payload(), tx.payload());
    }

    #[test]
    fn hash_changes_with_signatures() {
        let tx = chunked(10);
        let before = tx.hash().unwrap();
        assert_eq!(before.len(), 48);

        let mut signed = tx.clone();
        let pair = SignaturePair {
            public_key: Keypair::generate().public_key(),
            signature: crate::keys::Signature::from_bytes(vec![0; 64]),
        };
        signed.chunks[0].signatures.push(pair);
        assert_ne!(signed.hash().unwrap(), before);
    }
}
