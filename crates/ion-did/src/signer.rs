//! Signing seam for request bodies.

use async_trait::async_trait;
use ion_did_core::jws::{self, JwsHeader};
use ion_did_core::{KeyPair, PrivateJwk};
use serde_json::Value;

use crate::error::Result;

/// Produces a compact JWS over a JSON payload.
///
/// Implementations outside this crate (hardware keys, remote signers) follow
/// the same contract as [`jws::sign`]: `alg` is set from the key's curve.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, header: JwsHeader, payload: &Value) -> Result<String>;
}

/// Signs with private key material held in memory.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    key: PrivateJwk,
}

impl LocalSigner {
    pub fn new(key: PrivateJwk) -> Self {
        Self { key }
    }

    pub fn from_keypair(pair: &KeyPair) -> Self {
        Self::new(pair.private_jwk.clone())
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn sign(&self, header: JwsHeader, payload: &Value) -> Result<String> {
        Ok(jws::sign(payload, header, &self.key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ion_did_core::Curve;
    use serde_json::json;

    #[tokio::test]
    async fn test_local_signer_verifies() {
        let pair = KeyPair::from_secret(Curve::Secp256k1, &[5; 32]).unwrap();
        let signer = LocalSigner::from_keypair(&pair);

        let jws = signer.sign(JwsHeader::new(), &json!({ "a": 1 })).await.unwrap();
        assert!(jws::verify(&jws, &pair.public_jwk).unwrap());
    }

    #[tokio::test]
    async fn test_bad_curve_surfaces() {
        let mut pair = KeyPair::from_secret(Curve::Ed25519, &[5; 32]).unwrap();
        pair.private_jwk.crv = "Ed448".into();

        let err = LocalSigner::from_keypair(&pair)
            .sign(JwsHeader::new(), &json!({}))
            .await
            .unwrap_err();
        assert!(err.is_unsupported_curve());
    }
}
