//! JWK-shaped key material for recovery and update keys.
//!
//! Keys are stored in the same JSON shape they are published in, so a
//! persisted operation log can be handed back verbatim. Byte-level access goes
//! through accessors that check lengths against the key's [`Curve`].

use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::curve::Curve;
use crate::error::{CoreError, Result};

/// Leading SEC1 byte for an uncompressed point (`x` and `y` both present).
pub const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;

/// Encode bytes as unpadded base64url.
pub fn b64url_encode(bytes: impl AsRef<[u8]>) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url.
pub fn b64url_decode(s: &str) -> Result<Vec<u8>> {
    BASE64_URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| CoreError::Encoding(format!("invalid base64url: {e}")))
}

fn decode_fixed(field: &str, value: &str) -> Result<[u8; 32]> {
    let bytes = b64url_decode(value)
        .map_err(|_| CoreError::InvalidKey(format!("`{field}` is not base64url")))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        CoreError::InvalidKey(format!("`{field}` must be 32 bytes, got {}", bytes.len()))
    })
}

/// A public key in JWK form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl PublicJwk {
    /// Resolve the `crv` tag.
    pub fn curve(&self) -> Result<Curve> {
        Curve::from_jwk_crv(&self.crv)
    }

    /// The decoded `x` coordinate.
    pub fn x_bytes(&self) -> Result<[u8; 32]> {
        decode_fixed("x", &self.x)
    }

    /// The decoded `y` coordinate.
    pub fn y_bytes(&self) -> Result<[u8; 32]> {
        let y = self
            .y
            .as_deref()
            .ok_or_else(|| CoreError::InvalidKey("missing `y` coordinate".into()))?;
        decode_fixed("y", y)
    }

    /// `0x04 || x || y`, the uncompressed SEC1 encoding of a secp256k1 key.
    pub fn sec1_uncompressed(&self) -> Result<[u8; 65]> {
        let mut out = [0u8; 65];
        out[0] = SEC1_UNCOMPRESSED_TAG;
        out[1..33].copy_from_slice(&self.x_bytes()?);
        out[33..].copy_from_slice(&self.y_bytes()?);
        Ok(out)
    }
}

/// A private key in JWK form (public members plus `d`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    pub d: String,
}

impl PrivateJwk {
    /// Resolve the `crv` tag.
    pub fn curve(&self) -> Result<Curve> {
        Curve::from_jwk_crv(&self.crv)
    }

    /// The decoded secret scalar (secp256k1) or seed (Ed25519).
    pub fn d_bytes(&self) -> Result<[u8; 32]> {
        decode_fixed("d", &self.d)
    }

    /// Strip the secret member.
    pub fn to_public(&self) -> PublicJwk {
        PublicJwk {
            kty: self.kty.clone(),
            crv: self.crv.clone(),
            x: self.x.clone(),
            y: self.y.clone(),
        }
    }
}

impl fmt::Debug for PrivateJwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateJwk")
            .field("kty", &self.kty)
            .field("crv", &self.crv)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("d", &"<redacted>")
            .finish()
    }
}

/// A public/private JWK pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub public_jwk: PublicJwk,
    pub private_jwk: PrivateJwk,
}

impl KeyPair {
    /// Generate a fresh keypair on `curve`.
    pub fn generate<R: RngCore + CryptoRng>(curve: Curve, rng: &mut R) -> Self {
        match curve {
            Curve::Ed25519 => Self::from_ed25519(&ed25519_dalek::SigningKey::generate(rng)),
            Curve::Secp256k1 => Self::from_secp256k1(&k256::ecdsa::SigningKey::random(rng)),
        }
    }

    /// Derive a keypair from 32 bytes of secret material.
    ///
    /// For Ed25519 the bytes are the seed; for secp256k1 they are the scalar,
    /// which must be non-zero and below the group order.
    pub fn from_secret(curve: Curve, secret: &[u8; 32]) -> Result<Self> {
        match curve {
            Curve::Ed25519 => Ok(Self::from_ed25519(&ed25519_dalek::SigningKey::from_bytes(
                secret,
            ))),
            Curve::Secp256k1 => {
                let signing_key = k256::ecdsa::SigningKey::from_slice(secret)
                    .map_err(|_| CoreError::InvalidKey("secp256k1 scalar out of range".into()))?;
                Ok(Self::from_secp256k1(&signing_key))
            }
        }
    }

    fn from_ed25519(signing_key: &ed25519_dalek::SigningKey) -> Self {
        let curve = Curve::Ed25519;
        let x = b64url_encode(signing_key.verifying_key().to_bytes());
        Self {
            public_jwk: PublicJwk {
                kty: curve.key_type().into(),
                crv: curve.as_str().into(),
                x: x.clone(),
                y: None,
            },
            private_jwk: PrivateJwk {
                kty: curve.key_type().into(),
                crv: curve.as_str().into(),
                x,
                y: None,
                d: b64url_encode(signing_key.to_bytes()),
            },
        }
    }

    fn from_secp256k1(signing_key: &k256::ecdsa::SigningKey) -> Self {
        let curve = Curve::Secp256k1;
        let point = signing_key.verifying_key().as_affine().to_encoded_point(false);
        // Uncompressed SEC1: tag || x || y
        let bytes = point.as_bytes();
        let x = b64url_encode(&bytes[1..33]);
        let y = b64url_encode(&bytes[33..65]);
        Self {
            public_jwk: PublicJwk {
                kty: curve.key_type().into(),
                crv: curve.as_str().into(),
                x: x.clone(),
                y: Some(y.clone()),
            },
            private_jwk: PrivateJwk {
                kty: curve.key_type().into(),
                crv: curve.as_str().into(),
                x,
                y: Some(y),
                d: b64url_encode(signing_key.to_bytes()),
            },
        }
    }

    /// The curve both halves are tagged with.
    pub fn curve(&self) -> Result<Curve> {
        self.public_jwk.curve()
    }
}
