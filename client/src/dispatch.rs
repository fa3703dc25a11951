//! Dispatcher: one request to one node.
//!
//! The dispatcher resolves the node, performs exactly one unary call, and
//! interprets the precheck verdict. It never retries: whether a rejected
//! submission is worth resending (and under which id) is the caller's
//! decision, because resending an accepted transaction would be a duplicate.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::id::{EntityId, TransactionId};
use crate::network::Network;
use crate::operation::DispatchMethod;
use crate::wire::{self, PrecheckResponse};

/// Sends encoded submissions through a [`Network`].
#[derive(Clone)]
pub struct Dispatcher {
    network: Arc<dyn Network>,
}

impl Dispatcher {
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self { network }
    }

    /// The channel provider this dispatcher sends through.
    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Submits `request` to `node` and returns the precheck response when
    /// the node admitted it.
    ///
    /// Any status other than `OK`/`SUCCESS` becomes
    /// [`Error::PrecheckRejected`] carrying `transaction_id`.
    pub async fn send(
        &self,
        node: &EntityId,
        transaction_id: &TransactionId,
        method: DispatchMethod,
        request: Vec<u8>,
    ) -> Result<PrecheckResponse> {
        let endpoint = self.network.resolve_node(node)?;
        debug!(
            node = %endpoint,
            %method,
            transaction_id = %transaction_id,
            bytes = request.len(),
            "dispatching submission"
        );

        let reply = self.network.unary_call(&endpoint, method, request).await?;
        let response: PrecheckResponse = wire::decode(&reply)?;

        if !response.status.is_precheck_accepted() {
            warn!(
                node = %node,
                transaction_id = %transaction_id,
                status = %response.status,
                "submission rejected at precheck"
            );
            return Err(Error::PrecheckRejected {
                status: response.status,
                transaction_id: *transaction_id,
            });
        }

        debug!(
            transaction_id = %transaction_id,
            cost = response.cost,
            "submission admitted"
        );
        Ok(response)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Timestamp;
    use crate::network::NodeEndpoint;
    use crate::status::Status;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedReply {
        known: EntityId,
        status: Status,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Network for FixedReply {
        fn resolve_node(&self, node: &EntityId) -> Result<NodeEndpoint> {
            if *node == self.known {
                Ok(NodeEndpoint {
                    node: *node,
                    address: "127.0.0.1:50211".into(),
                })
            } else {
                Err(Error::UnknownNode(*node))
            }
        }

        async fn unary_call(
            &self,
            _endpoint: &NodeEndpoint,
            _method: DispatchMethod,
            _request: Vec<u8>,
        ) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            wire::encode(&PrecheckResponse {
                status: self.status,
                cost: 7,
            })
        }
    }

    fn setup(status: Status) -> (Arc<FixedReply>, Dispatcher) {
        let network = Arc::new(FixedReply {
            known: EntityId::from_num(3),
            status,
            calls: AtomicUsize::new(0),
        });
        (network.clone(), Dispatcher::new(network))
    }

    fn tx_id() -> TransactionId {
        TransactionId::new(EntityId::from_num(1001), Timestamp::new(1_700_000_000, 0))
    }

    #[tokio::test]
    async fn accepted_submission_returns_response() {
        let (network, dispatcher) = setup(Status::Ok);
        let resp = dispatcher
            .send(
                &EntityId::from_num(3),
                &tx_id(),
                DispatchMethod::GET_RECEIPT,
                vec![1],
            )
            .await
            .unwrap();
        assert_eq!(resp.cost, 7);
        assert_eq!(network.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_submission_is_not_retried() {
        let (network, dispatcher) = setup(Status::InsufficientPayerBalance);
        let err = dispatcher
            .send(
                &EntityId::from_num(3),
                &tx_id(),
                DispatchMethod::GET_RECEIPT,
                vec![1],
            )
            .await
            .unwrap_err();
        match err {
            Error::PrecheckRejected {
                status,
                transaction_id,
            } => {
                assert_eq!(status, Status::InsufficientPayerBalance);
                assert_eq!(transaction_id, tx_id());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(network.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_node_makes_no_call() {
        let (network, dispatcher) = setup(Status::Ok);
        let err = dispatcher
            .send(
                &EntityId::from_num(99),
                &tx_id(),
                DispatchMethod::GET_RECEIPT,
                vec![],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownNode(_)));
        assert_eq!(network.calls.load(Ordering::SeqCst), 0);
    }
}
