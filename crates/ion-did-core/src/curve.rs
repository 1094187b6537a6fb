//! Curve tags for operation keys.
//!
//! Keys travel as JWKs whose `crv` member is a free-form string. Every
//! cryptographic code path converts that string into [`Curve`] first, so an
//! unknown tag fails once, at the boundary, and the rest of the crate matches
//! exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The two curves supported for recovery and update keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    /// Edwards curve, signatures with `EdDSA`.
    #[serde(rename = "Ed25519")]
    Ed25519,
    /// Koblitz curve, signatures with `ES256K` over a SHA-256 digest.
    #[serde(rename = "secp256k1")]
    Secp256k1,
}

impl Curve {
    /// Parse a JWK `crv` member.
    ///
    /// Only the curve names are accepted here. The `EdDSA`/`ES256K` aliases
    /// that [`FromStr`] allows are for picking a curve to generate keys on,
    /// not for key material.
    pub fn from_jwk_crv(crv: &str) -> Result<Self, CoreError> {
        match crv {
            "Ed25519" => Ok(Curve::Ed25519),
            "secp256k1" => Ok(Curve::Secp256k1),
            other => Err(CoreError::UnsupportedCurve(other.to_string())),
        }
    }

    /// The JWK `crv` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Curve::Ed25519 => "Ed25519",
            Curve::Secp256k1 => "secp256k1",
        }
    }

    /// The JWK `kty` value.
    pub fn key_type(self) -> &'static str {
        match self {
            Curve::Ed25519 => "OKP",
            Curve::Secp256k1 => "EC",
        }
    }

    /// The JWS `alg` header value for signatures made with this curve.
    pub fn jws_algorithm(self) -> &'static str {
        match self {
            Curve::Ed25519 => "EdDSA",
            Curve::Secp256k1 => "ES256K",
        }
    }

    /// Length in bytes of a compact signature.
    pub fn signature_len(self) -> usize {
        64
    }

    /// Whether public keys on this curve carry a `y` coordinate.
    pub fn has_y(self) -> bool {
        matches!(self, Curve::Secp256k1)
    }
}

impl FromStr for Curve {
    type Err = CoreError;

    /// Accepts the JWK curve names and the matching JWS algorithm names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ed25519" | "EdDSA" => Ok(Curve::Ed25519),
            "secp256k1" | "ES256K" => Ok(Curve::Secp256k1),
            other => Err(CoreError::UnsupportedCurve(other.to_string())),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_aliases() {
        assert_eq!("Ed25519".parse::<Curve>().unwrap(), Curve::Ed25519);
        assert_eq!("EdDSA".parse::<Curve>().unwrap(), Curve::Ed25519);
        assert_eq!("secp256k1".parse::<Curve>().unwrap(), Curve::Secp256k1);
        assert_eq!("ES256K".parse::<Curve>().unwrap(), Curve::Secp256k1);
    }

    #[test]
    fn test_jwk_crv_rejects_aliases() {
        assert_eq!(Curve::from_jwk_crv("Ed25519").unwrap(), Curve::Ed25519);
        assert_eq!(Curve::from_jwk_crv("secp256k1").unwrap(), Curve::Secp256k1);
        for alias in ["EdDSA", "ES256K", "ed25519"] {
            assert!(matches!(
                Curve::from_jwk_crv(alias),
                Err(CoreError::UnsupportedCurve(tag)) if tag == alias
            ));
        }
    }

    #[test]
    fn test_unknown_curve_rejected() {
        let err = "P-256".parse::<Curve>().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedCurve(tag) if tag == "P-256"));
    }

    #[test]
    fn test_curve_serde_uses_jwk_names() {
        assert_eq!(
            serde_json::to_string(&Curve::Secp256k1).unwrap(),
            "\"secp256k1\""
        );
        assert_eq!(
            serde_json::from_str::<Curve>("\"Ed25519\"").unwrap(),
            Curve::Ed25519
        );
    }
}
