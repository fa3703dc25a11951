//! Identifiers and timestamps.
//!
//! These are the value types every other module speaks in. They are `Copy`,
//! structurally compared, and never mutated in place: deriving a new value
//! (for example the start time of the next chunk) always produces a new one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A network-addressable entity: account, node, file, topic, contract.
///
/// Canonical text form is `"shard.realm.num"`, e.g. `0.0.3` for the first
/// consensus node on a default network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl EntityId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Shorthand for an entity in shard 0, realm 0.
    pub const fn from_num(num: u64) -> Self {
        Self::new(0, 0, num)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidEntityId(s.to_string());

        let mut parts = s.split('.');
        let mut next = || -> Result<u64, Error> {
            parts
                .next()
                .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
                .ok_or_else(invalid)?
                .parse::<u64>()
                .map_err(|_| invalid())
        };

        let shard = next()?;
        let realm = next()?;
        let num = next()?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(shard, realm, num))
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// An absolute instant with nanosecond resolution, relative to the Unix epoch.
///
/// `nanos` is always below one second; constructors normalize any overflow
/// into `seconds`, which keeps the derived ordering correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self {
            seconds: seconds.saturating_add((nanos / NANOS_PER_SECOND) as i64),
            nanos: nanos % NANOS_PER_SECOND,
        }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let now = Utc::now();
        Self::new(now.timestamp(), now.timestamp_subsec_nanos())
    }

    /// Builds a timestamp from a duration since the Unix epoch.
    pub fn from_unix(since_epoch: Duration) -> Self {
        Self::new(saturating_secs(since_epoch.as_secs()), since_epoch.subsec_nanos())
    }

    /// Returns a new timestamp `secs` whole seconds later.
    pub fn plus_seconds(self, secs: u64) -> Self {
        Self {
            seconds: self.seconds.saturating_add(saturating_secs(secs)),
            nanos: self.nanos,
        }
    }

    /// Returns a new timestamp `duration` later.
    pub fn plus(self, duration: Duration) -> Self {
        let nanos = self.nanos + duration.subsec_nanos();
        Self::new(
            self.seconds.saturating_add(saturating_secs(duration.as_secs())),
            nanos,
        )
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        let delta = self.total_nanos() - earlier.total_nanos();
        if delta <= 0 {
            return Duration::ZERO;
        }
        let secs = (delta / NANOS_PER_SECOND as i128) as u64;
        let nanos = (delta % NANOS_PER_SECOND as i128) as u32;
        Duration::new(secs, nanos)
    }

    fn total_nanos(self) -> i128 {
        self.seconds as i128 * NANOS_PER_SECOND as i128 + self.nanos as i128
    }
}

/// Unsigned seconds as `i64`, pinned at `i64::MAX` instead of wrapping.
fn saturating_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

// ---------------------------------------------------------------------------
// TransactionId
// ---------------------------------------------------------------------------

/// The idempotency key of a submission: who pays, and when it starts.
///
/// Two submissions carrying the same `TransactionId` are the same logical
/// transaction as far as the network is concerned; the second one is
/// rejected as a duplicate.
///
/// Text form: `"shard.realm.num@seconds.nanos"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId {
    pub payer: EntityId,
    pub valid_start: Timestamp,
}

impl TransactionId {
    pub fn new(payer: EntityId, valid_start: Timestamp) -> Self {
        Self { payer, valid_start }
    }

    /// A fresh id for `payer` starting now.
    pub fn generate(payer: EntityId) -> Self {
        Self::new(payer, Timestamp::now())
    }

    /// The id of a later chunk: same payer, start shifted by whole seconds.
    pub fn offset_seconds(&self, secs: u64) -> Self {
        Self::new(self.payer, self.valid_start.plus_seconds(secs))
    }

    /// The instant after which the network no longer accepts or resolves
    /// this transaction.
    pub fn deadline(&self, validity_window: Duration) -> Timestamp {
        self.valid_start.plus(validity_window)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.payer, self.valid_start)
    }
}

impl FromStr for TransactionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidTransactionId(s.to_string());

        let (payer, start) = s.split_once('@').ok_or_else(invalid)?;
        let payer: EntityId = payer.parse().map_err(|_| invalid())?;

        let (secs, nanos) = start.split_once('.').ok_or_else(invalid)?;
        if nanos.is_empty() || nanos.len() > 9 || !nanos.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let seconds = secs.parse::<i64>().map_err(|_| invalid())?;
        // Right-pad so "1.5" means half a second, not five nanoseconds.
        let nanos = format!("{:0<9}", nanos)
            .parse::<u32>()
            .map_err(|_| invalid())?;

        Ok(Self::new(payer, Timestamp::new(seconds, nanos)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_offsets_saturate_instead_of_wrapping() {
        let start = Timestamp::new(1_700_000_000, 0);
        let far = start.plus(Duration::from_secs(u64::MAX));
        assert_eq!(far.seconds, i64::MAX);
        assert!(far > start);
        assert_eq!(start.plus_seconds(u64::MAX).seconds, i64::MAX);
        assert_eq!(Timestamp::from_unix(Duration::MAX).seconds, i64::MAX);

        let id = TransactionId::new(EntityId::from_num(1001), start);
        assert!(id.deadline(Duration::from_secs(u64::MAX)) > start);
    }

    #[test]
    fn entity_id_display_and_parse() {
        let id = EntityId::new(1, 2, 345);
        assert_eq!(id.to_string(), "1.2.345");
        assert_eq!("1.2.345".parse::<EntityId>().unwrap(), id);
    }

    #[test]
    fn entity_id_rejects_malformed_text() {
        for bad in ["", "1.2", "1.2.3.4", "a.b.c", "1..3", "-1.0.3", "1.2.3 "] {
            assert!(
                bad.parse::<EntityId>().is_err(),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn entity_id_equality_is_structural() {
        assert_eq!(EntityId::from_num(3), EntityId::new(0, 0, 3));
        assert_ne!(EntityId::new(0, 1, 3), EntityId::new(0, 0, 3));
    }

    #[test]
    fn timestamp_normalizes_nanos() {
        let ts = Timestamp::new(10, 2_500_000_000);
        assert_eq!(ts, Timestamp::new(12, 500_000_000));
    }

    #[test]
    fn timestamp_plus_seconds_keeps_nanos() {
        let ts = Timestamp::new(1_700_000_000, 42);
        assert_eq!(ts.plus_seconds(10), Timestamp::new(1_700_000_010, 42));
    }

    #[test]
    fn timestamp_plus_duration_carries() {
        let ts = Timestamp::new(5, 900_000_000);
        let later = ts.plus(Duration::from_millis(250));
        assert_eq!(later, Timestamp::new(6, 150_000_000));
    }

    #[test]
    fn saturating_duration_since() {
        let a = Timestamp::new(100, 0);
        let b = Timestamp::new(101, 500);
        assert_eq!(b.saturating_duration_since(a), Duration::new(1, 500));
        assert_eq!(a.saturating_duration_since(b), Duration::ZERO);
    }

    #[test]
    fn timestamp_ordering() {
        assert!(Timestamp::new(1, 999_999_999) < Timestamp::new(2, 0));
        assert!(Timestamp::new(2, 1) > Timestamp::new(2, 0));
    }

    #[test]
    fn now_is_after_2023() {
        assert!(Timestamp::now().seconds > 1_700_000_000);
    }

    #[test]
    fn transaction_id_text_roundtrip() {
        let id = TransactionId::new(EntityId::from_num(1001), Timestamp::new(1_700_000_000, 7));
        let text = id.to_string();
        assert_eq!(text, "0.0.1001@1700000000.000000007");
        assert_eq!(text.parse::<TransactionId>().unwrap(), id);
    }

    #[test]
    fn transaction_id_parses_short_fraction() {
        let id: TransactionId = "0.0.2@10.5".parse().unwrap();
        assert_eq!(id.valid_start, Timestamp::new(10, 500_000_000));
    }

    #[test]
    fn transaction_id_rejects_malformed_text() {
        for bad in ["0.0.2", "0.0.2@", "0.0.2@10", "x@10.0", "0.0.2@10.1234567890"] {
            assert!(bad.parse::<TransactionId>().is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn offset_and_deadline() {
        let id = TransactionId::new(EntityId::from_num(2), Timestamp::new(1_000, 0));
        assert_eq!(id.offset_seconds(20).valid_start, Timestamp::new(1_020, 0));
        assert_eq!(id.offset_seconds(20).payer, id.payer);
        assert_eq!(
            id.deadline(Duration::from_secs(120)),
            Timestamp::new(1_120, 0)
        );
    }
}
