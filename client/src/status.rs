//! Response codes returned by service nodes.
//!
//! The same code space is used for two different answers: the immediate
//! *precheck* verdict on a submission, and the *receipt* status that
//! describes the consensus outcome. [`Status::is_precheck_accepted`] and
//! [`Status::receipt_class`] interpret a code in each of those roles.
//!
//! On the wire a status is its bare `i32` code. Codes this client does not
//! know survive a round trip as [`Status::Unrecognized`] so that nothing is
//! lost when a newer node answers an older client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a receipt status should be treated by the outcome resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptClass {
    /// Not final yet; poll again later.
    Pending,
    /// Reached consensus and succeeded.
    Success,
    /// Reached a terminal, unsuccessful outcome. Polling again cannot change it.
    Failure,
}

macro_rules! statuses {
    ($( $(#[$doc:meta])* $variant:ident = $code:literal => $name:literal, )+) => {
        /// A node response code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "i32", into = "i32")]
        pub enum Status {
            $( $(#[$doc])* $variant, )+
            /// A code outside the set this client was built with.
            Unrecognized(i32),
        }

        impl Status {
            /// Numeric code as carried on the wire.
            pub fn code(&self) -> i32 {
                match self {
                    $( Self::$variant => $code, )+
                    Self::Unrecognized(code) => *code,
                }
            }

            /// Symbolic name, e.g. `"INVALID_SIGNATURE"`.
            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                    Self::Unrecognized(_) => "UNRECOGNIZED",
                }
            }

            pub fn from_code(code: i32) -> Self {
                match code {
                    $( $code => Self::$variant, )+
                    other => Self::Unrecognized(other),
                }
            }
        }
    };
}

statuses! {
    /// Accepted for consensus (precheck) or not yet final (receipt).
    Ok = 0 => "OK",
    InvalidTransaction = 1 => "INVALID_TRANSACTION",
    PayerAccountNotFound = 2 => "PAYER_ACCOUNT_NOT_FOUND",
    /// The body names a different node than the one it was sent to.
    InvalidNodeAccount = 3 => "INVALID_NODE_ACCOUNT",
    TransactionExpired = 4 => "TRANSACTION_EXPIRED",
    InvalidTransactionStart = 5 => "INVALID_TRANSACTION_START",
    InvalidTransactionDuration = 6 => "INVALID_TRANSACTION_DURATION",
    InvalidSignature = 7 => "INVALID_SIGNATURE",
    MemoTooLong = 8 => "MEMO_TOO_LONG",
    InsufficientTxFee = 9 => "INSUFFICIENT_TX_FEE",
    InsufficientPayerBalance = 10 => "INSUFFICIENT_PAYER_BALANCE",
    DuplicateTransaction = 11 => "DUPLICATE_TRANSACTION",
    Busy = 12 => "BUSY",
    NotSupported = 13 => "NOT_SUPPORTED",
    InvalidFileId = 14 => "INVALID_FILE_ID",
    InvalidAccountId = 15 => "INVALID_ACCOUNT_ID",
    /// The node has not seen the transaction (yet).
    ReceiptNotFound = 18 => "RECEIPT_NOT_FOUND",
    /// Known to the node but consensus has not been reached.
    Unknown = 21 => "UNKNOWN",
    Success = 22 => "SUCCESS",
    FailInvalid = 23 => "FAIL_INVALID",
    FailFee = 24 => "FAIL_FEE",
    FailBalance = 25 => "FAIL_BALANCE",
    InsufficientAccountBalance = 28 => "INSUFFICIENT_ACCOUNT_BALANCE",
    PlatformNotActive = 54 => "PLATFORM_NOT_ACTIVE",
    TransactionOversize = 57 => "TRANSACTION_OVERSIZE",
    InvalidTopicId = 150 => "INVALID_TOPIC_ID",
    InvalidChunkNumber = 208 => "INVALID_CHUNK_NUMBER",
    InvalidChunkTransactionId = 209 => "INVALID_CHUNK_TRANSACTION_ID",
}

impl Status {
    /// `true` if a precheck response with this code means the node admitted
    /// the submission for consensus.
    pub fn is_precheck_accepted(&self) -> bool {
        matches!(self, Self::Ok | Self::Success)
    }

    /// Classifies a receipt status for the polling loop.
    pub fn receipt_class(&self) -> ReceiptClass {
        match self {
            Self::Success => ReceiptClass::Success,
            Self::Ok
            | Self::Unknown
            | Self::Busy
            | Self::ReceiptNotFound
            | Self::PlatformNotActive => ReceiptClass::Pending,
            _ => ReceiptClass::Failure,
        }
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip_for_known_statuses() {
        for status in [
            Status::Ok,
            Status::InvalidSignature,
            Status::DuplicateTransaction,
            Status::Success,
            Status::InvalidChunkTransactionId,
        ] {
            assert_eq!(Status::from_code(status.code()), status);
        }
    }

    #[test]
    fn unknown_codes_are_preserved() {
        let status = Status::from_code(9_999);
        assert_eq!(status, Status::Unrecognized(9_999));
        assert_eq!(status.code(), 9_999);
        assert_eq!(status.name(), "UNRECOGNIZED");
    }

    #[test]
    fn display_carries_name_and_code() {
        assert_eq!(Status::InvalidSignature.to_string(), "INVALID_SIGNATURE (7)");
    }

    #[test]
    fn precheck_acceptance() {
        assert!(Status::Ok.is_precheck_accepted());
        assert!(Status::Success.is_precheck_accepted());
        assert!(!Status::Busy.is_precheck_accepted());
        assert!(!Status::DuplicateTransaction.is_precheck_accepted());
    }

    #[test]
    fn receipt_classification() {
        assert_eq!(Status::Unknown.receipt_class(), ReceiptClass::Pending);
        assert_eq!(Status::ReceiptNotFound.receipt_class(), ReceiptClass::Pending);
        assert_eq!(Status::Success.receipt_class(), ReceiptClass::Success);
        assert_eq!(Status::FailBalance.receipt_class(), ReceiptClass::Failure);
        assert_eq!(
            Status::Unrecognized(4242).receipt_class(),
            ReceiptClass::Failure
        );
    }

    #[test]
    fn serializes_as_bare_code() {
        let json = serde_json::to_string(&Status::Success).unwrap();
        assert_eq!(json, "22");
        let recovered: Status = serde_json::from_str("7").unwrap();
        assert_eq!(recovered, Status::InvalidSignature);
    }
}
