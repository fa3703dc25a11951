// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NOVA Client — Transaction Submission Engine
//!
//! The piece of NOVA that lives on the caller's side of the wire: it turns an
//! operation into a signed, addressed request, hands it to one service node,
//! and then keeps asking the network what happened until it gets a final
//! answer or the transaction's validity window closes.
//!
//! ## Architecture
//!
//! - **id** — `EntityId`, `Timestamp`, `TransactionId`. Plain value types.
//! - **status** — Response codes with their numeric and symbolic forms.
//! - **keys** — Ed25519 key material for the local signer.
//! - **signer** — The `Signer` capability (local key or external signer).
//! - **operation** — Operation kinds and the node method each one targets.
//! - **chunk** — Splitting oversized payloads into ordered chunks.
//! - **wire** — Binary envelope for bodies, signatures, and node replies.
//! - **network** — Interfaces to the channel provider and node selection.
//! - **dispatch** — One request to one node, precheck interpreted.
//! - **receipt** — Receipts and the receipt lookup interface.
//! - **resolver** — Backoff-driven polling for the consensus outcome.
//! - **transaction** — Builder, frozen transaction, and lifecycle handle.
//! - **config** — Protocol constants and client tunables.
//!
//! ## Lifecycle
//!
//! ```text
//! TransactionBuilder ──freeze──► FrozenTransaction ──sign──► (signed)
//!                                        │
//!                                   execute (per chunk) ──► Dispatcher
//!                                        │
//!                                   confirm ──► OutcomeResolver ──► Receipt
//! ```
//!
//! A builder is the only mutable form. Freezing is a one-way conversion
//! that fixes the node, the transaction id, and the exact body bytes;
//! after that the only thing that can change is the set of signatures.

pub mod chunk;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod keys;
pub mod network;
pub mod operation;
pub mod receipt;
pub mod resolver;
pub mod signer;
pub mod status;
pub mod transaction;
pub mod wire;

pub use dispatch::Dispatcher;
pub use error::{Error, PartialExecution, Result};
pub use id::{EntityId, Timestamp, TransactionId};
pub use operation::{DispatchMethod, OperationKind};
pub use receipt::{Receipt, ReceiptSource};
pub use resolver::{BackoffPolicy, OutcomeResolver};
pub use signer::{ExternalSigner, LocalSigner, SignaturePair, Signer};
pub use status::Status;
pub use transaction::{
    ChunkOutcome, FrozenTransaction, Transaction, TransactionBuilder, TransactionResponse,
};
