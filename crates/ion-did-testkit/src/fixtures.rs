//! Test fixtures and injectable collaborators.
//!
//! Deterministic and misbehaving stand-ins for the seams of a
//! [`DidState`]: key generation, long-form encoding, anchoring.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ion_did::net::{AnchorSubmitter, NetError};
use ion_did::{
    DidConfig, DidError, DidState, IonEncoder, KeyPairProvider, LongFormEncoder, RandomKeyProvider,
    Result,
};
use ion_did_core::{CoreError, Curve, KeyPair, PublicJwk};

/// The secret for the `counter`-th key drawn from `seed`:
/// `SHA-256(seed || counter as u64 little-endian)`.
pub fn seeded_secret(seed: &[u8; 32], counter: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(counter.to_le_bytes());
    let mut secret = [0u8; 32];
    secret.copy_from_slice(&hasher.finalize());
    secret
}

/// Keys derived from a seed and a call counter.
///
/// The same seed and the same sequence of calls give the same keys.
pub struct SeededKeyProvider {
    seed: [u8; 32],
    counter: AtomicU64,
}

impl SeededKeyProvider {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }

    /// Keys handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyPairProvider for SeededKeyProvider {
    async fn generate(&self, curve: Curve) -> Result<KeyPair> {
        let counter = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(KeyPair::from_secret(curve, &seeded_secret(&self.seed, counter))?)
    }
}

/// Wraps a provider and sleeps a pseudo-random time before each key.
///
/// Makes completion order differ from issue order whenever calls are not
/// serialized.
pub struct DelayedKeyProvider<P> {
    inner: P,
    max_delay: Duration,
    rng: Mutex<StdRng>,
}

impl<P: KeyPairProvider> DelayedKeyProvider<P> {
    pub fn new(inner: P, max_delay: Duration, rng_seed: u64) -> Self {
        Self {
            inner,
            max_delay,
            rng: Mutex::new(StdRng::seed_from_u64(rng_seed)),
        }
    }
}

#[async_trait]
impl<P: KeyPairProvider> KeyPairProvider for DelayedKeyProvider<P> {
    async fn generate(&self, curve: Curve) -> Result<KeyPair> {
        let max_micros = self.max_delay.as_micros() as u64;
        let delay = Duration::from_micros(self.rng.lock().gen_range(0..=max_micros));
        tokio::time::sleep(delay).await;
        self.inner.generate(curve).await
    }
}

/// How a [`FlakyKeyProvider`] misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Return an error.
    Error,
    /// Panic inside the task.
    Panic,
}

/// Fails on one chosen call (0-based) and delegates otherwise.
pub struct FlakyKeyProvider<P> {
    inner: P,
    fail_on: usize,
    failure: Failure,
    calls: AtomicUsize,
}

impl<P: KeyPairProvider> FlakyKeyProvider<P> {
    pub fn new(inner: P, fail_on: usize, failure: Failure) -> Self {
        Self {
            inner,
            fail_on,
            failure,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<P: KeyPairProvider> KeyPairProvider for FlakyKeyProvider<P> {
    async fn generate(&self, curve: Curve) -> Result<KeyPair> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on {
            match self.failure {
                Failure::Error => {
                    return Err(DidError::Core(CoreError::InvalidKey(format!(
                        "injected failure on call {call}"
                    ))))
                }
                Failure::Panic => panic!("injected panic on call {call}"),
            }
        }
        self.inner.generate(curve).await
    }
}

/// Counts how often the long form is actually computed.
pub struct CountingEncoder<E = IonEncoder> {
    inner: E,
    calls: AtomicUsize,
}

impl<E: LongFormEncoder> CountingEncoder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for CountingEncoder {
    fn default() -> Self {
        Self::new(IonEncoder::default())
    }
}

impl<E: LongFormEncoder> LongFormEncoder for CountingEncoder<E> {
    fn long_form(&self, recovery: &PublicJwk, update: &PublicJwk, content: &Value) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.long_form(recovery, update, content)
    }
}

/// Records every submitted request and accepts it.
#[derive(Default)]
pub struct RecordingSubmitter {
    submitted: Mutex<Vec<Value>>,
}

impl RecordingSubmitter {
    pub fn submitted(&self) -> Vec<Value> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl AnchorSubmitter for RecordingSubmitter {
    async fn submit(
        &self,
        request: &Value,
        _challenge_endpoint: &str,
        _solution_endpoint: &str,
    ) -> std::result::Result<Value, NetError> {
        self.submitted.lock().push(request.clone());
        Ok(json!({ "status": "accepted" }))
    }
}

/// A DID wired to a seeded key provider and a counting encoder.
pub struct DidFixture {
    pub did: DidState,
    pub keys: Arc<SeededKeyProvider>,
    pub encoder: Arc<CountingEncoder>,
}

impl DidFixture {
    /// A fresh DID with seed `[0x42; 32]` and default configuration.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_seed([0x42; 32], DidConfig::default())
    }

    pub fn with_seed(seed: [u8; 32], config: DidConfig) -> Result<Self> {
        let keys = Arc::new(SeededKeyProvider::new(seed));
        let encoder = Arc::new(CountingEncoder::new(IonEncoder::from_config(&config)));
        let did = DidState::builder()
            .config(config)
            .key_provider(keys.clone())
            .encoder(encoder.clone())
            .build()?;
        Ok(Self { did, keys, encoder })
    }
}

/// A DID whose key generation sleeps up to `max_delay` per key.
pub fn delayed_did(max_delay: Duration, rng_seed: u64) -> Result<DidState> {
    DidState::builder()
        .key_provider(Arc::new(DelayedKeyProvider::new(
            RandomKeyProvider,
            max_delay,
            rng_seed,
        )))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ion_did::OperationKind;

    #[tokio::test]
    async fn test_seeded_keys_repeat() {
        let a = SeededKeyProvider::new([7; 32]);
        let b = SeededKeyProvider::new([7; 32]);

        for curve in [Curve::Secp256k1, Curve::Ed25519] {
            assert_eq!(
                a.generate(curve).await.unwrap(),
                b.generate(curve).await.unwrap()
            );
        }
        assert_eq!(a.issued(), 2);
    }

    #[tokio::test]
    async fn test_seeded_keys_differ_per_call() {
        let keys = SeededKeyProvider::new([7; 32]);
        let first = keys.generate(Curve::Ed25519).await.unwrap();
        let second = keys.generate(Curve::Ed25519).await.unwrap();
        assert_ne!(first.public_jwk, second.public_jwk);
    }

    #[tokio::test]
    async fn test_flaky_fails_once() {
        let keys = FlakyKeyProvider::new(RandomKeyProvider, 1, Failure::Error);
        assert!(keys.generate(Curve::Ed25519).await.is_ok());
        assert!(keys.generate(Curve::Ed25519).await.is_err());
        assert!(keys.generate(Curve::Ed25519).await.is_ok());
        assert_eq!(keys.calls(), 3);
    }

    #[tokio::test]
    async fn test_fixture_counts_encodings() {
        let fixture = DidFixture::new().unwrap();
        fixture.did.uri(ion_did::UriForm::Long).await.unwrap();
        fixture.did.uri(ion_did::UriForm::Short).await.unwrap();

        assert_eq!(fixture.encoder.calls(), 1);
        assert_eq!(fixture.keys.issued(), 2);
    }

    #[tokio::test]
    async fn test_delayed_did_still_creates() {
        let did = delayed_did(Duration::from_millis(5), 1).unwrap();
        let op = did
            .generate_operation(OperationKind::Update, json!({}))
            .await
            .unwrap();
        assert_eq!(op.kind, OperationKind::Update);
    }
}
