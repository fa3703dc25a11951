//! Receipts and receipt lookup.
//!
//! A receipt is the network's record of a transaction's consensus outcome.
//! Looking one up is free, which is what makes polling for it acceptable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use crate::error::Result;
use crate::id::{EntityId, TransactionId};
use crate::network::Network;
use crate::operation::DispatchMethod;
use crate::status::Status;
use crate::wire::{self, ReceiptQuery};

/// The outcome of a transaction as recorded by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: Status,
    pub transaction_id: TransactionId,
    /// Account, file, topic, token, or contract created by the transaction.
    pub created_entity: Option<EntityId>,
    /// Topic sequence number assigned to a submitted message.
    pub sequence_number: Option<u64>,
}

impl Receipt {
    /// A receipt carrying only a status.
    pub fn bare(status: Status, transaction_id: TransactionId) -> Self {
        Self {
            status,
            transaction_id,
            created_entity: None,
            sequence_number: None,
        }
    }
}

/// Reply to a receipt lookup.
///
/// `status` is the answer to the lookup itself (`RECEIPT_NOT_FOUND`,
/// `BUSY`, ...). Once the node knows the transaction, `receipt` is present
/// and its status is the transaction's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub status: Status,
    pub receipt: Option<Receipt>,
}

impl ReceiptResponse {
    /// The status that decides the outcome: the receipt's when there is one,
    /// otherwise the lookup status.
    pub fn outcome_status(&self) -> Status {
        self.receipt
            .as_ref()
            .map(|r| r.status)
            .unwrap_or(self.status)
    }

    /// The receipt, or a bare one built from the outcome status.
    pub fn into_receipt(self, transaction_id: TransactionId) -> Receipt {
        let status = self.outcome_status();
        self.receipt
            .unwrap_or_else(|| Receipt::bare(status, transaction_id))
    }
}

/// Something that can answer a receipt lookup.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    async fn get_receipt(&self, transaction_id: &TransactionId) -> Result<ReceiptResponse>;
}

/// Receipt lookups over a [`Network`], sent to one node.
#[derive(Clone)]
pub struct NetworkReceiptSource {
    network: Arc<dyn Network>,
    node: EntityId,
}

impl NetworkReceiptSource {
    pub fn new(network: Arc<dyn Network>, node: EntityId) -> Self {
        Self { network, node }
    }

    pub fn node(&self) -> EntityId {
        self.node
    }
}

#[async_trait]
impl ReceiptSource for NetworkReceiptSource {
    async fn get_receipt(&self, transaction_id: &TransactionId) -> Result<ReceiptResponse> {
        let endpoint = self.network.resolve_node(&self.node)?;
        let request = wire::encode(&ReceiptQuery {
            transaction_id: *transaction_id,
        })?;
        let reply = self
            .network
            .unary_call(&endpoint, DispatchMethod::GET_RECEIPT, request)
            .await?;
        let response: ReceiptResponse = wire::decode(&reply)?;
        trace!(
            node = %self.node,
            transaction_id = %transaction_id,
            status = %response.outcome_status(),
            "receipt lookup"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::id::Timestamp;
    use crate::network::NodeEndpoint;

    fn tx_id() -> TransactionId {
        TransactionId::new(EntityId::from_num(1001), Timestamp::new(1_700_000_000, 0))
    }

    struct ReceiptNode;

    #[async_trait]
    impl Network for ReceiptNode {
        fn resolve_node(&self, node: &EntityId) -> Result<NodeEndpoint> {
            Ok(NodeEndpoint {
                node: *node,
                address: "mem".into(),
            })
        }

        async fn unary_call(
            &self,
            _endpoint: &NodeEndpoint,
            method: DispatchMethod,
            request: Vec<u8>,
        ) -> Result<Vec<u8>> {
            if method != DispatchMethod::GET_RECEIPT {
                return Err(Error::Network(format!("unexpected method {method}")));
            }
            let query: ReceiptQuery = wire::decode(&request)?;
            wire::encode(&ReceiptResponse {
                status: Status::Ok,
                receipt: Some(Receipt {
                    status: Status::Success,
                    transaction_id: query.transaction_id,
                    created_entity: Some(EntityId::from_num(5005)),
                    sequence_number: None,
                }),
            })
        }
    }

    #[test]
    fn outcome_status_prefers_receipt() {
        let pending = ReceiptResponse {
            status: Status::ReceiptNotFound,
            receipt: None,
        };
        assert_eq!(pending.outcome_status(), Status::ReceiptNotFound);

        let done = ReceiptResponse {
            status: Status::Ok,
            receipt: Some(Receipt::bare(Status::FailBalance, tx_id())),
        };
        assert_eq!(done.outcome_status(), Status::FailBalance);
    }

    #[test]
    fn bare_receipt_when_node_sends_none() {
        let resp = ReceiptResponse {
            status: Status::Success,
            receipt: None,
        };
        assert_eq!(resp.into_receipt(tx_id()), Receipt::bare(Status::Success, tx_id()));
    }

    #[tokio::test]
    async fn network_source_queries_receipt_method() {
        let source = NetworkReceiptSource::new(Arc::new(ReceiptNode), EntityId::from_num(3));
        let resp = source.get_receipt(&tx_id()).await.unwrap();
        let receipt = resp.receipt.unwrap();
        assert_eq!(receipt.transaction_id, tx_id());
        assert_eq!(receipt.created_entity, Some(EntityId::from_num(5005)));
    }
}
