//! Operation kinds and the node method each one is dispatched to.
//!
//! The per-operation builders (transfers, file writes, token actions, ...)
//! live outside this crate. What this crate needs from them is the payload
//! bytes and one discriminant, [`OperationKind`], which decides:
//!
//! - the stable `u16` tag written into the body,
//! - which node method receives the submission ([`DispatchMethod`]),
//! - whether an oversized payload may be split into chunks.
//!
//! The set is closed. A decoded tag outside it is an explicit
//! [`Error::UnsupportedOperation`], never a silent default.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

// ---------------------------------------------------------------------------
// DispatchMethod
// ---------------------------------------------------------------------------

/// A unary node method, addressed as `/service/method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchMethod {
    pub service: &'static str,
    pub method: &'static str,
}

impl DispatchMethod {
    const fn new(service: &'static str, method: &'static str) -> Self {
        Self { service, method }
    }

    /// Receipt lookup. Free of charge on the node side, so it is safe to poll.
    pub const GET_RECEIPT: DispatchMethod =
        DispatchMethod::new("proto.CryptoService", "getTransactionReceipts");

    /// Full request path, e.g. `/proto.CryptoService/cryptoTransfer`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service, self.method)
    }
}

impl fmt::Display for DispatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.service, self.method)
    }
}

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

const CRYPTO: &str = "proto.CryptoService";
const FILE: &str = "proto.FileService";
const CONTRACT: &str = "proto.SmartContractService";
const CONSENSUS: &str = "proto.ConsensusService";
const TOKEN: &str = "proto.TokenService";

/// The operation a transaction body carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    CryptoTransfer,
    AccountCreate,
    AccountUpdate,
    AccountDelete,
    FileCreate,
    /// Appends bytes to an existing file. Chunkable.
    FileAppend,
    FileUpdate,
    FileDelete,
    ContractCreate,
    ContractCall,
    TopicCreate,
    /// Publishes a message to a topic. Chunkable.
    TopicMessageSubmit,
    TokenCreate,
    TokenMint,
    TokenBurn,
}

impl OperationKind {
    /// Every kind this client understands.
    pub const ALL: [OperationKind; 15] = [
        Self::CryptoTransfer,
        Self::AccountCreate,
        Self::AccountUpdate,
        Self::AccountDelete,
        Self::FileCreate,
        Self::FileAppend,
        Self::FileUpdate,
        Self::FileDelete,
        Self::ContractCreate,
        Self::ContractCall,
        Self::TopicCreate,
        Self::TopicMessageSubmit,
        Self::TokenCreate,
        Self::TokenMint,
        Self::TokenBurn,
    ];

    /// Stable wire tag. Never renumber an existing kind.
    pub fn tag(&self) -> u16 {
        match self {
            Self::CryptoTransfer => 1,
            Self::AccountCreate => 2,
            Self::AccountUpdate => 3,
            Self::AccountDelete => 4,
            Self::FileCreate => 10,
            Self::FileAppend => 11,
            Self::FileUpdate => 12,
            Self::FileDelete => 13,
            Self::ContractCreate => 20,
            Self::ContractCall => 21,
            Self::TopicCreate => 30,
            Self::TopicMessageSubmit => 31,
            Self::TokenCreate => 40,
            Self::TokenMint => 41,
            Self::TokenBurn => 42,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u16) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == tag)
            .ok_or(Error::UnsupportedOperation { tag })
    }

    /// The node method a submission of this kind is sent to.
    pub fn dispatch_method(&self) -> DispatchMethod {
        match self {
            Self::CryptoTransfer => DispatchMethod::new(CRYPTO, "cryptoTransfer"),
            Self::AccountCreate => DispatchMethod::new(CRYPTO, "createAccount"),
            Self::AccountUpdate => DispatchMethod::new(CRYPTO, "updateAccount"),
            Self::AccountDelete => DispatchMethod::new(CRYPTO, "cryptoDelete"),
            Self::FileCreate => DispatchMethod::new(FILE, "createFile"),
            Self::FileAppend => DispatchMethod::new(FILE, "appendContent"),
            Self::FileUpdate => DispatchMethod::new(FILE, "updateFile"),
            Self::FileDelete => DispatchMethod::new(FILE, "deleteFile"),
            Self::ContractCreate => DispatchMethod::new(CONTRACT, "createContract"),
            Self::ContractCall => DispatchMethod::new(CONTRACT, "contractCallMethod"),
            Self::TopicCreate => DispatchMethod::new(CONSENSUS, "createTopic"),
            Self::TopicMessageSubmit => DispatchMethod::new(CONSENSUS, "submitMessage"),
            Self::TokenCreate => DispatchMethod::new(TOKEN, "createToken"),
            Self::TokenMint => DispatchMethod::new(TOKEN, "mintToken"),
            Self::TokenBurn => DispatchMethod::new(TOKEN, "burnToken"),
        }
    }

    /// `true` if an oversized payload of this kind may be split into
    /// ordered chunks. Other kinds must fit in a single chunk.
    pub fn is_chunkable(&self) -> bool {
        matches!(self, Self::FileAppend | Self::TopicMessageSubmit)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
