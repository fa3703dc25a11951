//! # Outcome Resolver
//!
//! Turns "the node accepted my submission" into "the network reached
//! consensus on it, and here is the result" by polling a [`ReceiptSource`].
//!
//! ## Polling schedule
//!
//! ```text
//! now >= deadline?  ──yes──► ConsensusTimeout (no poll)
//!      │ no
//! sleep(min(initial_delay, deadline - now))
//!      │
//! poll ──► Success ──► Ok(receipt)
//!      ├─► Failure ──► ConsensusFailure
//!      └─► Pending ──► backoff(attempt); now + backoff > deadline?
//!                           ──yes──► ConsensusTimeout
//!                           ──no───► sleep(backoff), attempt += 1, poll
//! ```
//!
//! The backoff after poll `attempt` (1-based) is
//! `base_delay * jitter * (multiplier^attempt - 1)`, held within
//! `[min_delay, max_delay]`. With the default doubling and a mean jitter of
//! one, the gaps run 250ms, 750ms, 1.75s, 3.75s, 7.75s, 8s, ...
//!
//! A failed lookup (transport error, unknown node, garbled reply) counts as
//! pending. The receipt exists independently of whether one particular
//! lookup got through, and the deadline still bounds the loop.
//!
//! Time comes from a [`Clock`] and randomness from a [`Jitter`] so that the
//! schedule can be driven deterministically.

use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config;
use crate::error::{Error, Result};
use crate::id::{Timestamp, TransactionId};
use crate::receipt::{Receipt, ReceiptSource};
use crate::status::{ReceiptClass, Status};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of wall-clock time and of suspension.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    async fn sleep(&self, duration: Duration);
}

/// System time plus tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ---------------------------------------------------------------------------
// Jitter
// ---------------------------------------------------------------------------

/// Multiplier applied to each backoff step.
pub trait Jitter: Send + Sync + fmt::Debug {
    fn sample(&self) -> f64;
}

/// Uniform in `[0.5, 1.5)`, mean 1. Spreads out clients that were
/// rejected together so they do not poll in lockstep.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(0.5..1.5)
    }
}

/// Always the same factor.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl Jitter for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// BackoffPolicy
// ---------------------------------------------------------------------------

/// Timing of the receipt polling loop.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Wait before the first poll.
    pub initial_delay: Duration,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub jitter: Arc<dyn Jitter>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: config::RECEIPT_INITIAL_DELAY,
            base_delay: config::RECEIPT_BACKOFF_BASE,
            multiplier: config::RECEIPT_BACKOFF_MULTIPLIER,
            min_delay: config::RECEIPT_BACKOFF_MIN,
            max_delay: config::RECEIPT_BACKOFF_MAX,
            jitter: Arc::new(RandomJitter),
        }
    }
}

impl BackoffPolicy {
    /// Replaces the jitter source.
    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Gap to wait after poll number `attempt` (1-based) came back pending.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let raw = self.base_delay.as_secs_f64()
            * self.jitter.sample()
            * (self.multiplier.powi(exponent) - 1.0);

        let delay = if !raw.is_finite() || raw >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else if raw <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(raw)
        };
        delay.max(self.min_delay).min(self.max_delay)
    }
}

// ---------------------------------------------------------------------------
// OutcomeResolver
// ---------------------------------------------------------------------------

/// Polls a [`ReceiptSource`] until a transaction's outcome is final or its
/// deadline passes.
#[derive(Clone)]
pub struct OutcomeResolver {
    source: Arc<dyn ReceiptSource>,
    policy: BackoffPolicy,
    clock: Arc<dyn Clock>,
}

impl OutcomeResolver {
    pub fn new(source: Arc<dyn ReceiptSource>, policy: BackoffPolicy) -> Self {
        Self {
            source,
            policy,
            clock: Arc::new(TokioClock),
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Polls for the receipt of `transaction_id` until it is final or
    /// `deadline` would be passed.
    pub async fn resolve(
        &self,
        transaction_id: &TransactionId,
        deadline: Timestamp,
    ) -> Result<Receipt> {
        let timeout = || Error::ConsensusTimeout {
            transaction_id: *transaction_id,
            deadline,
        };

        let now = self.clock.now();
        if now >= deadline {
            warn!(
                transaction_id = %transaction_id,
                %deadline,
                "deadline already passed, not polling"
            );
            return Err(timeout());
        }

        let initial = self
            .policy
            .initial_delay
            .min(deadline.saturating_duration_since(now));
        self.clock.sleep(initial).await;

        let mut attempt: u32 = 1;
        loop {
            let response = match self.source.get_receipt(transaction_id).await {
                Ok(response) => Some(response),
                Err(e) => {
                    debug!(
                        transaction_id = %transaction_id,
                        attempt,
                        error = %e,
                        "receipt lookup failed, treating as pending"
                    );
                    None
                }
            };

            let status = response
                .as_ref()
                .map(|r| r.outcome_status())
                .unwrap_or(Status::Unknown);

            match status.receipt_class() {
                ReceiptClass::Success => {
                    debug!(transaction_id = %transaction_id, attempt, "consensus reached");
                    let receipt = response
                        .map(|r| r.into_receipt(*transaction_id))
                        .unwrap_or_else(|| Receipt::bare(status, *transaction_id));
                    return Ok(receipt);
                }
                ReceiptClass::Failure => {
                    warn!(
                        transaction_id = %transaction_id,
                        %status,
                        "transaction failed at consensus"
                    );
                    return Err(Error::ConsensusFailure {
                        status,
                        transaction_id: *transaction_id,
                    });
                }
                ReceiptClass::Pending => {}
            }

            let backoff = self.policy.backoff(attempt);
            let now = self.clock.now();
            if now.plus(backoff) > deadline {
                warn!(
                    transaction_id = %transaction_id,
                    %deadline,
                    polls = attempt,
                    "outcome still pending at deadline"
                );
                return Err(timeout());
            }

            debug!(
                transaction_id = %transaction_id,
                attempt,
                %status,
                backoff_ms = backoff.as_millis() as u64,
                "receipt pending"
            );
            self.clock.sleep(backoff).await;
            attempt = attempt.saturating_add(1);
        }
    }
}

impl fmt::Debug for OutcomeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeResolver")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
