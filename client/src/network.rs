//! # Network Interfaces
//!
//! The client does not own a transport. It talks to whatever the embedding
//! application provides through two small traits:
//!
//! - [`Network`] resolves a node id to an endpoint and performs one unary
//!   call against it. TLS, framing, and connection pooling are its business.
//! - [`NodeSelector`] picks the node a new transaction should be addressed
//!   to when the caller did not name one. Health tracking and load shedding
//!   live behind it.
//!
//! Both are `Send + Sync` so a single instance can be shared behind an
//! `Arc` by every in-flight transaction.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;
use crate::id::EntityId;
use crate::operation::DispatchMethod;

/// A resolved node: its account id and a transport address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeEndpoint {
    pub node: EntityId,
    pub address: String,
}

impl fmt::Display for NodeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.node, self.address)
    }
}

/// Channel provider.
#[async_trait]
pub trait Network: Send + Sync {
    /// Looks up the endpoint for `node`. Unknown nodes are
    /// [`Error::UnknownNode`](crate::Error::UnknownNode).
    fn resolve_node(&self, node: &EntityId) -> Result<NodeEndpoint>;

    /// Sends `request` to `method` on `endpoint` and returns the raw reply.
    ///
    /// Transport failures are reported as
    /// [`Error::Network`](crate::Error::Network).
    async fn unary_call(
        &self,
        endpoint: &NodeEndpoint,
        method: DispatchMethod,
        request: Vec<u8>,
    ) -> Result<Vec<u8>>;
}

/// Chooses a node for a transaction that does not name one.
pub trait NodeSelector: Send + Sync {
    /// `None` when no node is currently eligible.
    fn select_node(&self) -> Option<EntityId>;
}

/// A fixed node.
impl NodeSelector for EntityId {
    fn select_node(&self) -> Option<EntityId> {
        Some(*self)
    }
}

/// Round-robin over a static node list.
#[derive(Debug)]
pub struct RoundRobin {
    nodes: Vec<EntityId>,
    next: std::sync::atomic::AtomicUsize,
}

impl RoundRobin {
    pub fn new(nodes: Vec<EntityId>) -> Self {
        Self {
            nodes,
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl NodeSelector for RoundRobin {
    fn select_node(&self) -> Option<EntityId> {
        if self.nodes.is_empty() {
            return None;
        }
        let i = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Some(self.nodes[i % self.nodes.len()])
    }
}
