//! # Transaction Module
//!
//! Construction, freezing, signing, submission, and confirmation of
//! transactions.
//!
//! ## Architecture
//!
//! ```text
//! builder.rs   — TransactionBuilder: the only mutable stage; freeze()
//! frozen.rs    — FrozenTransaction: fixed bodies, signatures, chunk cursor
//! response.rs  — TransactionResponse and ChunkOutcome
//! lifecycle.rs — Transaction: one handle with runtime state checks
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: set the operation payload and submission parameters.
//! 2. **Freeze**: pick the node and id, split into chunks, encode bodies.
//! 3. **Sign**: any number of signers, each covering every chunk.
//! 4. **Execute**: submit the next chunk; the node answers with a precheck.
//! 5. **Confirm**: poll the receipt until consensus or the deadline.
//!
//! `execute_all` runs steps 4 and 5 for every chunk in order and reports
//! how far it got when something fails.

pub mod builder;
pub mod frozen;
pub mod lifecycle;
pub mod response;

pub use builder::TransactionBuilder;
pub use frozen::FrozenTransaction;
pub use lifecycle::Transaction;
pub use response::{ChunkOutcome, TransactionResponse};
