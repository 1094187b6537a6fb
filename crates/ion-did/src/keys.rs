//! Keypair generation for new operations.

use async_trait::async_trait;
use ion_did_core::{Curve, KeyPair};
use rand::rngs::OsRng;

use crate::error::Result;

/// Produces a fresh keypair on request.
///
/// Injected into [`DidState`](crate::DidState) so tests can substitute a
/// deterministic or slow source.
#[async_trait]
pub trait KeyPairProvider: Send + Sync {
    async fn generate(&self, curve: Curve) -> Result<KeyPair>;

    /// Generate from a JWK `crv` tag or JWS `alg` name.
    async fn generate_for(&self, tag: &str) -> Result<KeyPair> {
        let curve: Curve = tag.parse()?;
        self.generate(curve).await
    }
}

/// Keys from the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyProvider;

#[async_trait]
impl KeyPairProvider for RandomKeyProvider {
    async fn generate(&self, curve: Curve) -> Result<KeyPair> {
        Ok(KeyPair::generate(curve, &mut OsRng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generates_on_requested_curve() {
        for curve in [Curve::Ed25519, Curve::Secp256k1] {
            let pair = RandomKeyProvider.generate(curve).await.unwrap();
            assert_eq!(pair.curve().unwrap(), curve);
            assert_eq!(pair.public_jwk.y.is_some(), curve.has_y());
        }
    }

    #[tokio::test]
    async fn test_unknown_tag_is_unsupported_curve() {
        let err = RandomKeyProvider.generate_for("P-521").await.unwrap_err();
        assert!(err.is_unsupported_curve());

        let pair = RandomKeyProvider.generate_for("ES256K").await.unwrap();
        assert_eq!(pair.public_jwk.crv, "secp256k1");
    }
}
