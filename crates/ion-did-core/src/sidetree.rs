//! Sidetree v1 encoding as used by `did:ion`.
//!
//! Every hash is a SHA-256 multihash (`0x12 0x20 || digest`) encoded as
//! unpadded base64url. JSON is hashed in its RFC 8785 (JCS) canonical form.
//!
//! ## Key Types
//!
//! - [`Delta`] - document patches plus the next update commitment
//! - [`SuffixData`] - the part of a create whose hash is the DID suffix
//! - [`CreateOperation`] - both halves; also the long-form payload
//! - [`ContentPatch`] - update content expressed as Sidetree patch actions

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::jwk::{b64url_encode, PublicJwk};

/// Multihash header for a 32-byte SHA2-256 digest.
pub const MULTIHASH_SHA256_PREFIX: [u8; 2] = [0x12, 0x20];

/// Canonicalize a value with JCS.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_jcs::to_string(value).map_err(|e| CoreError::Encoding(format!("JCS: {e}")))
}

/// `0x12 0x20 || SHA256(data)`.
pub fn multihash(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(34);
    out.extend_from_slice(&MULTIHASH_SHA256_PREFIX);
    out.extend_from_slice(&Sha256::digest(data));
    out
}

/// Base64url of the multihash of `data`.
pub fn hash_encode(data: &[u8]) -> String {
    b64url_encode(multihash(data))
}

/// The value revealed when a key is used: the multihash of its canonical JWK.
pub fn reveal_value(jwk: &PublicJwk) -> Result<String> {
    Ok(hash_encode(canonicalize(jwk)?.as_bytes()))
}

/// The commitment published for a key that will be used later.
///
/// Hashing the canonical JWK twice means the commitment is the hash of the
/// reveal digest.
pub fn commitment(jwk: &PublicJwk) -> Result<String> {
    let canonical = canonicalize(jwk)?;
    Ok(hash_encode(&Sha256::digest(canonical.as_bytes())))
}

/// `{"action":"replace","document":…}`.
pub fn replace_patch(document: &Value) -> Value {
    json!({ "action": "replace", "document": document })
}

/// Document patches plus the commitment for the next update key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    pub patches: Vec<Value>,
    pub update_commitment: String,
}

impl Delta {
    pub fn new(patches: Vec<Value>, next_update: &PublicJwk) -> Result<Self> {
        Ok(Self {
            patches,
            update_commitment: commitment(next_update)?,
        })
    }

    /// Multihash of the canonical delta.
    pub fn hash(&self) -> Result<String> {
        Ok(hash_encode(canonicalize(self)?.as_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuffixData {
    pub delta_hash: String,
    pub recovery_commitment: String,
}

impl SuffixData {
    /// The DID suffix: multihash of the canonical suffix data.
    pub fn did_suffix(&self) -> Result<String> {
        Ok(hash_encode(canonicalize(self)?.as_bytes()))
    }
}

/// The two halves of a create operation.
///
/// Serializes as `{"delta":…,"suffixData":…}`, which is exactly the payload
/// appended to a long-form DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperation {
    pub delta: Delta,
    pub suffix_data: SuffixData,
}

impl CreateOperation {
    /// Build a create that replaces the whole document with `document`.
    pub fn new(recovery: &PublicJwk, update: &PublicJwk, document: &Value) -> Result<Self> {
        Self::from_delta(Delta::new(vec![replace_patch(document)], update)?, recovery)
    }

    pub fn from_delta(delta: Delta, recovery: &PublicJwk) -> Result<Self> {
        let suffix_data = SuffixData {
            delta_hash: delta.hash()?,
            recovery_commitment: commitment(recovery)?,
        };
        Ok(Self { delta, suffix_data })
    }

    pub fn did_suffix(&self) -> Result<String> {
        self.suffix_data.did_suffix()
    }

    /// The create request body: `{"type":"create","suffixData":…,"delta":…}`.
    pub fn to_request(&self) -> Result<Value> {
        Ok(json!({
            "type": "create",
            "suffixData": serde_json::to_value(&self.suffix_data)?,
            "delta": serde_json::to_value(&self.delta)?,
        }))
    }
}

/// `did:<method>[:<network>]:<suffix>`.
pub fn short_form_did(method: &str, network: Option<&str>, suffix: &str) -> String {
    match network {
        Some(network) => format!("did:{method}:{network}:{suffix}"),
        None => format!("did:{method}:{suffix}"),
    }
}

/// `<short form>:<base64url(JCS(create))>`.
pub fn long_form_did(method: &str, network: Option<&str>, create: &CreateOperation) -> Result<String> {
    let short = short_form_did(method, network, &create.did_suffix()?);
    let initial_state = b64url_encode(canonicalize(create)?);
    Ok(format!("{short}:{initial_state}"))
}

/// Update content expressed as patch actions.
///
/// Read from the content of an update operation. Unknown members are
/// ignored; missing members mean no change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentPatch {
    pub add_services: Vec<Value>,
    pub remove_services: Vec<String>,
    pub add_public_keys: Vec<Value>,
    pub remove_public_keys: Vec<String>,
}

impl ContentPatch {
    /// Read a patch from operation content. `null` is an empty patch.
    pub fn from_content(content: &Value) -> Result<Self> {
        if content.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(content.clone())
            .map_err(|e| CoreError::InvalidOperation(format!("update content: {e}")))
    }

    pub fn is_empty(&self) -> bool {
        self.add_services.is_empty()
            && self.remove_services.is_empty()
            && self.add_public_keys.is_empty()
            && self.remove_public_keys.is_empty()
    }

    /// Sidetree patch actions, in a fixed order; empty groups are skipped.
    pub fn to_patches(&self) -> Vec<Value> {
        let mut patches = Vec::new();
        if !self.add_services.is_empty() {
            patches.push(json!({ "action": "add-services", "services": self.add_services }));
        }
        if !self.remove_services.is_empty() {
            patches.push(json!({ "action": "remove-services", "ids": self.remove_services }));
        }
        if !self.add_public_keys.is_empty() {
            patches.push(json!({ "action": "add-public-keys", "publicKeys": self.add_public_keys }));
        }
        if !self.remove_public_keys.is_empty() {
            patches.push(json!({ "action": "remove-public-keys", "ids": self.remove_public_keys }));
        }
        patches
    }
}
