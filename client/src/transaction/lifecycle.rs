//! A single handle that moves through the whole lifecycle.
//!
//! [`TransactionBuilder`] and [`FrozenTransaction`] make misuse a compile
//! error. Callers that keep one value around (a UI form, a queue entry, a
//! binding for another language) get [`Transaction`] instead, which checks
//! the same rules at runtime: setters and `freeze` on a frozen handle fail
//! with [`Error::AlreadyFrozen`], and `sign`/`execute` on an unfrozen one
//! fail with [`Error::NotFrozen`].

use std::time::Duration;

use super::builder::TransactionBuilder;
use super::frozen::FrozenTransaction;
use super::response::{ChunkOutcome, TransactionResponse};
use crate::dispatch::Dispatcher;
use crate::error::{Error, PartialExecution, Result};
use crate::id::{EntityId, TransactionId};
use crate::network::NodeSelector;
use crate::operation::OperationKind;
use crate::resolver::OutcomeResolver;
use crate::signer::Signer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Building(TransactionBuilder),
    Frozen(FrozenTransaction),
}

impl Transaction {
    pub fn new(kind: OperationKind) -> Self {
        Self::Building(TransactionBuilder::new(kind))
    }

    /// Restores a frozen handle from serialized bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        FrozenTransaction::from_bytes(bytes).map(Self::Frozen)
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen(_))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Building(b) => b.kind(),
            Self::Frozen(f) => f.kind(),
        }
    }

    pub fn as_frozen(&self) -> Result<&FrozenTransaction> {
        match self {
            Self::Frozen(f) => Ok(f),
            Self::Building(_) => Err(Error::NotFrozen),
        }
    }

    pub fn as_frozen_mut(&mut self) -> Result<&mut FrozenTransaction> {
        match self {
            Self::Frozen(f) => Ok(f),
            Self::Building(_) => Err(Error::NotFrozen),
        }
    }

    fn update(
        &mut self,
        f: impl FnOnce(TransactionBuilder) -> TransactionBuilder,
    ) -> Result<&mut Self> {
        match self {
            Self::Building(builder) => {
                let placeholder = TransactionBuilder::new(builder.kind());
                let current = std::mem::replace(builder, placeholder);
                *builder = f(current);
                Ok(self)
            }
            Self::Frozen(_) => Err(Error::AlreadyFrozen),
        }
    }

    pub fn set_payload(&mut self, payload: Vec<u8>) -> Result<&mut Self> {
        self.update(|b| b.payload(payload))
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.update(|b| b.memo(memo))
    }

    pub fn set_max_fee(&mut self, max_fee: u64) -> Result<&mut Self> {
        self.update(|b| b.max_fee(max_fee))
    }

    pub fn set_validity_window(&mut self, window: Duration) -> Result<&mut Self> {
        self.update(|b| b.validity_window(window))
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<&mut Self> {
        self.update(|b| b.chunk_size(chunk_size))
    }

    pub fn set_max_chunks(&mut self, max_chunks: usize) -> Result<&mut Self> {
        self.update(|b| b.max_chunks(max_chunks))
    }

    pub fn set_transaction_id(&mut self, id: TransactionId) -> Result<&mut Self> {
        self.update(|b| b.transaction_id(id))
    }

    pub fn set_node(&mut self, node: EntityId) -> Result<&mut Self> {
        self.update(|b| b.node(node))
    }

    /// Freezes in place. On failure the handle stays editable.
    pub fn freeze(
        &mut self,
        selector: &dyn NodeSelector,
        operator: Option<EntityId>,
    ) -> Result<&mut Self> {
        let frozen = match self {
            Self::Building(builder) => builder.freeze_ref(selector, operator)?,
            Self::Frozen(_) => return Err(Error::AlreadyFrozen),
        };
        *self = Self::Frozen(frozen);
        Ok(self)
    }

    pub async fn sign(&mut self, signer: &dyn Signer) -> Result<&mut Self> {
        self.as_frozen_mut()?.sign(signer).await?;
        Ok(self)
    }

    pub async fn execute(&mut self, dispatcher: &Dispatcher) -> Result<TransactionResponse> {
        self.as_frozen_mut()?.execute(dispatcher).await
    }

    pub async fn execute_all(
        &mut self,
        dispatcher: &Dispatcher,
        resolver: &OutcomeResolver,
    ) -> std::result::Result<Vec<ChunkOutcome>, PartialExecution> {
        match self {
            Self::Frozen(f) => f.execute_all(dispatcher, resolver).await,
            Self::Building(_) => Err(PartialExecution {
                completed: Vec::new(),
                error: Error::NotFrozen,
            }),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.as_frozen()?.to_bytes()
    }
}

impl From<TransactionBuilder> for Transaction {
    fn from(builder: TransactionBuilder) -> Self {
        Self::Building(builder)
    }
}

impl From<FrozenTransaction> for Transaction {
    fn from(frozen: FrozenTransaction) -> Self {
        Self::Frozen(frozen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Timestamp;
    use crate::network::RoundRobin;
    use crate::signer::LocalSigner;

    const NODE: EntityId = EntityId::new(0, 0, 3);

    fn tx_id() -> TransactionId {
        TransactionId::new(EntityId::from_num(1001), Timestamp::new(1_700_000_000, 0))
    }

    #[test]
    fn freezing_twice_fails() {
        let mut tx = Transaction::new(OperationKind::CryptoTransfer);
        tx.set_transaction_id(tx_id()).unwrap();
        tx.freeze(&NODE, None).unwrap();
        assert!(tx.is_frozen());
        assert!(matches!(tx.freeze(&NODE, None), Err(Error::AlreadyFrozen)));
    }

    #[test]
    fn setters_fail_once_frozen() {
        let mut tx = Transaction::new(OperationKind::CryptoTransfer);
        tx.set_memo("before")
            .unwrap()
            .freeze(&NODE, Some(EntityId::from_num(1001)))
            .unwrap();
        assert!(matches!(tx.set_memo("after"), Err(Error::AlreadyFrozen)));
        assert!(matches!(tx.set_max_fee(1), Err(Error::AlreadyFrozen)));
        assert_eq!(tx.as_frozen().unwrap().memo(), "before");
    }

    #[test]
    fn setters_update_the_builder_in_place() {
        let mut tx = Transaction::new(OperationKind::FileAppend);
        tx.set_payload(vec![7; 4096]).unwrap();
        let payload_at = match &tx {
            Transaction::Building(b) => b.payload_bytes().as_ptr(),
            Transaction::Frozen(_) => unreachable!(),
        };

        tx.set_memo("note").unwrap().set_max_fee(9).unwrap();
        match &tx {
            Transaction::Building(b) => {
                assert_eq!(b.payload_bytes().as_ptr(), payload_at);
                assert_eq!(b.payload_bytes().len(), 4096);
                assert_eq!(b.memo_str(), "note");
                assert_eq!(b.kind(), OperationKind::FileAppend);
            }
            Transaction::Frozen(_) => unreachable!(),
        }
    }

    #[tokio::test]
    async fn sign_and_execute_require_freeze() {
        let mut tx = Transaction::new(OperationKind::CryptoTransfer);
        let err = tx.sign(&LocalSigner::generate()).await.unwrap_err();
        assert!(matches!(err, Error::NotFrozen));
        assert!(matches!(tx.to_bytes(), Err(Error::NotFrozen)));
    }

    #[test]
    fn failed_freeze_keeps_builder() {
        let mut tx = Transaction::new(OperationKind::CryptoTransfer);
        tx.set_payload(vec![1, 2, 3]).unwrap();
        let err = tx.freeze(&RoundRobin::new(Vec::new()), None).unwrap_err();
        assert!(matches!(err, Error::MissingIdentity));
        assert!(!tx.is_frozen());

        tx.set_transaction_id(tx_id()).unwrap();
        tx.freeze(&NODE, None).unwrap();
        assert_eq!(tx.as_frozen().unwrap().payload(), &[1, 2, 3]);
    }

    #[test]
    fn bytes_restore_a_frozen_handle() {
        let mut tx = Transaction::new(OperationKind::TopicMessageSubmit);
        tx.set_transaction_id(tx_id()).unwrap();
        tx.freeze(&NODE, None).unwrap();
        let restored = Transaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
        assert!(restored.is_frozen());
        assert_eq!(restored.kind(), OperationKind::TopicMessageSubmit);
        assert_eq!(
            restored.as_frozen().unwrap().transaction_id(),
            tx.as_frozen().unwrap().transaction_id()
        );
    }
}
