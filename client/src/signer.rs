//! Signing capability.
//!
//! Signing is separate from building because the key may not live in this
//! process: it can sit in a hardware token, a custody service, or another
//! team's signing daemon. Every signer is therefore driven through the same
//! async call. A local key answers immediately; an external one suspends
//! until its backend replies. The lifecycle code awaits both the same way.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::keys::{Keypair, PublicKey, Signature};

/// Errors raised by a signer backend.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The backend answered with an error.
    #[error("external signer failed: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// A signature together with the key that produced it.
///
/// A transaction can carry any number of these; nodes check each one
/// against the exact body bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl SignaturePair {
    /// `true` if the signature is a valid Ed25519 signature over `message`.
    pub fn verify(&self, message: &[u8]) -> bool {
        self.public_key.verify(message, &self.signature)
    }
}

/// Something that can sign bytes on behalf of one public key.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The key signatures from this signer verify against.
    fn public_key(&self) -> PublicKey;

    /// Signs `message`. May suspend.
    async fn sign(&self, message: &[u8]) -> Result<Signature, SignerError>;
}

/// Signs `message` and pairs the result with the signer's public key.
pub(crate) async fn sign_pair(
    signer: &dyn Signer,
    message: &[u8],
) -> Result<SignaturePair, SignerError> {
    let signature = signer.sign(message).await?;
    Ok(SignaturePair {
        public_key: signer.public_key(),
        signature,
    })
}

// ---------------------------------------------------------------------------
// LocalSigner
// ---------------------------------------------------------------------------

/// An in-process Ed25519 key. Never suspends.
#[derive(Clone, Debug)]
pub struct LocalSigner {
    keypair: Keypair,
}

impl LocalSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn generate() -> Self {
        Self::new(Keypair::generate())
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature, SignerError> {
        Ok(self.keypair.sign(message))
    }
}

// ---------------------------------------------------------------------------
// ExternalSigner
// ---------------------------------------------------------------------------

type SignFn = dyn Fn(Vec<u8>) -> BoxFuture<'static, Result<Signature, SignerError>> + Send + Sync;

/// A signer backed by an async callback (HSM, remote service, wallet UI).
///
/// The callback receives an owned copy of the bytes to sign so it can move
/// them across a channel or into a request without borrowing from the
/// transaction.
#[derive(Clone)]
pub struct ExternalSigner {
    public_key: PublicKey,
    sign_fn: Arc<SignFn>,
}

impl ExternalSigner {
    pub fn new<F, Fut>(public_key: PublicKey, sign_fn: F) -> Self
    where
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Signature, SignerError>> + Send + 'static,
    {
        Self {
            public_key,
            sign_fn: Arc::new(move |message| sign_fn(message).boxed()),
        }
    }
}

impl fmt::Debug for ExternalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalSigner(pub={})", self.public_key.to_hex())
    }
}

#[async_trait]
impl Signer for ExternalSigner {
    fn public_key(&self) -> PublicKey {
        self.public_key.clone()
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature, SignerError> {
        (self.sign_fn)(message.to_vec()).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn local_signer_produces_verifiable_pair() {
        let signer = LocalSigner::generate();
        let pair = sign_pair(&signer, b"body bytes").await.unwrap();
        assert_eq!(pair.public_key, signer.public_key());
        assert!(pair.verify(b"body bytes"));
    }

    #[tokio::test(start_paused = true)]
    async fn external_signer_suspends_until_backend_answers() {
        let keypair = Keypair::generate();
        let public_key = keypair.public_key();
        let signer = ExternalSigner::new(public_key.clone(), move |message| {
            let keypair = keypair.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(keypair.sign(&message))
            }
        });

        let started = tokio::time::Instant::now();
        let pair = sign_pair(&signer, b"remote").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(pair.verify(b"remote"));
        assert_eq!(pair.public_key, public_key);
    }

    #[tokio::test]
    async fn external_signer_errors_propagate() {
        let signer = ExternalSigner::new(Keypair::generate().public_key(), |_| async {
            Err(SignerError::Unavailable("hsm offline".to_string()))
        });
        let err = signer.sign(b"x").await.unwrap_err();
        assert!(matches!(err, SignerError::Unavailable(_)));
    }

    #[tokio::test]
    async fn signers_are_usable_as_trait_objects() {
        let signers: Vec<Box<dyn Signer>> = vec![
            Box::new(LocalSigner::generate()),
            Box::new(ExternalSigner::new(Keypair::generate().public_key(), |_| async {
                Ok(Signature::from_bytes(vec![1, 2, 3]))
            })),
        ];
        for signer in &signers {
            assert!(signer.sign(b"m").await.is_ok());
        }
    }
}
