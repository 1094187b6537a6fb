//! Compact JWS signing and verification.
//!
//! Format: `base64url(header) . base64url(payload) . base64url(signature)`.
//!
//! - `EdDSA` (Ed25519) signs the ASCII bytes of `H.P` directly.
//! - `ES256K` (secp256k1) signs the SHA-256 digest of `H.P` and emits the
//!   64-byte compact `r || s` form, never DER.
//!
//! [`verify`] separates malformed input (an `Err`) from a well-formed JWS whose
//! signature does not match the key (`Ok(false)`).

use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::curve::Curve;
use crate::error::{CoreError, Result};
use crate::jwk::{b64url_decode, b64url_encode, PrivateJwk, PublicJwk};

/// Protected header members. `alg` is always overwritten when signing.
pub type JwsHeader = Map<String, Value>;

/// A compact JWS split into its decoded parts.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedJws {
    pub header: JwsHeader,
    pub payload: Value,
    pub signature: Vec<u8>,
}

/// The three base64url segments of a compact JWS, borrowed from the input.
struct Segments<'a> {
    signing_input: &'a str,
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

fn split(jws: &str) -> Result<Segments<'_>> {
    let mut parts = jws.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CoreError::MalformedJws("expected three segments".into()));
    };

    for (name, segment) in [("header", header), ("payload", payload)] {
        b64url_decode(segment)
            .map_err(|_| CoreError::MalformedJws(format!("{name} is not base64url")))?;
    }

    Ok(Segments {
        signing_input: &jws[..header.len() + 1 + payload.len()],
        header,
        payload,
        signature,
    })
}

/// Sign `payload` with `key`, returning a compact JWS.
///
/// `header.alg` is set from the key's curve. Header and payload are serialized
/// as UTF-8 JSON before encoding.
pub fn sign<T: Serialize + ?Sized>(payload: &T, header: JwsHeader, key: &PrivateJwk) -> Result<String> {
    let curve = key.curve()?;

    let mut header = header;
    header.insert("alg".into(), Value::String(curve.jws_algorithm().into()));

    let signing_input = format!(
        "{}.{}",
        b64url_encode(serde_json::to_vec(&header)?),
        b64url_encode(serde_json::to_vec(payload)?)
    );

    let secret = key.d_bytes()?;
    let signature = match curve {
        Curve::Ed25519 => ed25519_dalek::SigningKey::from_bytes(&secret)
            .sign(signing_input.as_bytes())
            .to_bytes()
            .to_vec(),
        Curve::Secp256k1 => {
            let signing_key = k256::ecdsa::SigningKey::from_slice(&secret)
                .map_err(|_| CoreError::InvalidKey("secp256k1 scalar out of range".into()))?;
            let digest = Sha256::digest(signing_input.as_bytes());
            let signature: k256::ecdsa::Signature = signing_key
                .sign_prehash(&digest)
                .map_err(|e| CoreError::InvalidKey(format!("ES256K signing failed: {e}")))?;
            signature.to_bytes().to_vec()
        }
    };

    Ok(format!("{signing_input}.{}", b64url_encode(signature)))
}

/// Verify a compact JWS against `key`.
///
/// Returns `Ok(false)` when the JWS is well formed but was not signed by
/// `key`. Returns an error for an unrecognized curve, a structurally invalid
/// JWS, or public key bytes that do not describe a point on the curve.
pub fn verify(jws: &str, key: &PublicJwk) -> Result<bool> {
    let curve = key.curve()?;
    let segments = split(jws)?;

    let signature = b64url_decode(segments.signature)
        .map_err(|_| CoreError::MalformedJws("signature is not base64url".into()))?;
    if signature.len() != curve.signature_len() {
        return Err(CoreError::MalformedJws(format!(
            "{} signature must be {} bytes, got {}",
            curve.jws_algorithm(),
            curve.signature_len(),
            signature.len()
        )));
    }
    let message = segments.signing_input.as_bytes();

    match curve {
        Curve::Secp256k1 => {
            let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&key.sec1_uncompressed()?)
                .map_err(|_| CoreError::InvalidKey("point is not on secp256k1".into()))?;
            // r or s outside the scalar field cannot have come from this key
            let Ok(signature) = k256::ecdsa::Signature::from_slice(&signature) else {
                return Ok(false);
            };
            let digest = Sha256::digest(message);
            Ok(verifying_key.verify_prehash(&digest, &signature).is_ok())
        }
        Curve::Ed25519 => {
            let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&key.x_bytes()?)
                .map_err(|_| CoreError::InvalidKey("point is not on Ed25519".into()))?;
            let signature = ed25519_dalek::Signature::from_slice(&signature)
                .map_err(|e| CoreError::MalformedJws(e.to_string()))?;
            Ok(verifying_key.verify(message, &signature).is_ok())
        }
    }
}

/// Decode header and payload without verifying the signature.
pub fn decode(jws: &str) -> Result<DecodedJws> {
    let segments = split(jws)?;
    let header = serde_json::from_slice(&b64url_decode(segments.header)?)
        .map_err(|e| CoreError::MalformedJws(format!("header: {e}")))?;
    let payload = serde_json::from_slice(&b64url_decode(segments.payload)?)
        .map_err(|e| CoreError::MalformedJws(format!("payload: {e}")))?;
    let signature = b64url_decode(segments.signature)
        .map_err(|_| CoreError::MalformedJws("signature is not base64url".into()))?;
    Ok(DecodedJws {
        header,
        payload,
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::KeyPair;
    use serde_json::json;

    fn keypair(curve: Curve, seed: u8) -> KeyPair {
        KeyPair::from_secret(curve, &[seed; 32]).unwrap()
    }

    #[test]
    fn test_sign_verify_both_curves() {
        for curve in [Curve::Secp256k1, Curve::Ed25519] {
            let signer = keypair(curve, 0x11);
            let other = keypair(curve, 0x22);
            let payload = json!({ "testing": "123" });

            let jws = sign(&payload, JwsHeader::new(), &signer.private_jwk).unwrap();

            assert!(verify(&jws, &signer.public_jwk).unwrap(), "{curve}: matching key");
            assert!(!verify(&jws, &other.public_jwk).unwrap(), "{curve}: other key");
        }
    }

    #[test]
    fn test_alg_header_follows_curve() {
        let es = sign(&json!(1), JwsHeader::new(), &keypair(Curve::Secp256k1, 1).private_jwk).unwrap();
        let ed = sign(&json!(1), JwsHeader::new(), &keypair(Curve::Ed25519, 1).private_jwk).unwrap();

        assert_eq!(decode(&es).unwrap().header["alg"], "ES256K");
        assert_eq!(decode(&ed).unwrap().header["alg"], "EdDSA");
    }

    #[test]
    fn test_extra_header_members_kept() {
        let mut header = JwsHeader::new();
        header.insert("kid".into(), json!("#key-1"));
        header.insert("alg".into(), json!("none"));

        let jws = sign(&json!({}), header, &keypair(Curve::Ed25519, 3).private_jwk).unwrap();
        let decoded = decode(&jws).unwrap();

        assert_eq!(decoded.header["kid"], "#key-1");
        assert_eq!(decoded.header["alg"], "EdDSA");
    }

    #[test]
    fn test_es256k_signature_is_compact_and_deterministic() {
        let pair = keypair(Curve::Secp256k1, 7);
        let a = sign(&json!({ "n": 1 }), JwsHeader::new(), &pair.private_jwk).unwrap();
        let b = sign(&json!({ "n": 1 }), JwsHeader::new(), &pair.private_jwk).unwrap();

        assert_eq!(a, b);
        assert_eq!(decode(&a).unwrap().signature.len(), 64);
    }

    #[test]
    fn test_tampered_payload_fails() {
        for curve in [Curve::Secp256k1, Curve::Ed25519] {
            let pair = keypair(curve, 9);
            let jws = sign(&json!({ "amount": 1 }), JwsHeader::new(), &pair.private_jwk).unwrap();

            let parts: Vec<&str> = jws.split('.').collect();
            let forged_payload = b64url_encode(br#"{"amount":1000}"#);
            let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

            assert!(!verify(&forged, &pair.public_jwk).unwrap());
        }
    }

    #[test]
    fn test_payload_roundtrips_through_decode() {
        let payload = json!({ "updateKey": { "x": "abc" }, "deltaHash": "Ei" });
        let jws = sign(&payload, JwsHeader::new(), &keypair(Curve::Ed25519, 5).private_jwk).unwrap();
        assert_eq!(decode(&jws).unwrap().payload, payload);
    }

    #[test]
    fn test_unsupported_curve_errors() {
        let pair = keypair(Curve::Ed25519, 4);
        let jws = sign(&json!({}), JwsHeader::new(), &pair.private_jwk).unwrap();

        let mut public = pair.public_jwk.clone();
        public.crv = "X25519".into();
        assert!(matches!(verify(&jws, &public), Err(CoreError::UnsupportedCurve(_))));

        let mut private = pair.private_jwk.clone();
        private.crv = "P-384".into();
        assert!(matches!(
            sign(&json!({}), JwsHeader::new(), &private),
            Err(CoreError::UnsupportedCurve(_))
        ));
    }

    #[test]
    fn test_algorithm_name_as_crv_is_unsupported() {
        for (curve, alias) in [(Curve::Secp256k1, "ES256K"), (Curve::Ed25519, "EdDSA")] {
            let pair = keypair(curve, 10);
            let jws = sign(&json!({}), JwsHeader::new(), &pair.private_jwk).unwrap();

            let mut private = pair.private_jwk.clone();
            private.crv = alias.into();
            assert!(matches!(
                sign(&json!({}), JwsHeader::new(), &private),
                Err(CoreError::UnsupportedCurve(tag)) if tag == alias
            ));

            let mut public = pair.public_jwk.clone();
            public.crv = alias.into();
            assert!(matches!(
                verify(&jws, &public),
                Err(CoreError::UnsupportedCurve(tag)) if tag == alias
            ));
        }
    }

    #[test]
    fn test_structurally_invalid_jws_errors() {
        let pair = keypair(Curve::Secp256k1, 6);

        assert!(matches!(verify("only.two", &pair.public_jwk), Err(CoreError::MalformedJws(_))));
        assert!(matches!(verify("a.b.c.d", &pair.public_jwk), Err(CoreError::MalformedJws(_))));
        assert!(matches!(verify("e30.e30.!!!", &pair.public_jwk), Err(CoreError::MalformedJws(_))));
        // 3 bytes of signature
        assert!(matches!(verify("e30.e30.AAAA", &pair.public_jwk), Err(CoreError::MalformedJws(_))));
    }

    #[test]
    fn test_secp256k1_key_without_y_errors() {
        let pair = keypair(Curve::Secp256k1, 8);
        let jws = sign(&json!({}), JwsHeader::new(), &pair.private_jwk).unwrap();

        let mut public = pair.public_jwk.clone();
        public.y = None;
        assert!(matches!(verify(&jws, &public), Err(CoreError::InvalidKey(_))));
    }
}
