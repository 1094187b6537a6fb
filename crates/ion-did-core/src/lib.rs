//! # ion-did Core
//!
//! Pure primitives for managing a `did:ion` identity: keys, compact JWS, the
//! operation log and its lifecycle rules, and Sidetree encoding.
//!
//! This crate contains no I/O, no async, no networking.
//!
//! ## Key Types
//!
//! - [`Curve`] - Ed25519 or secp256k1, resolved from a JWK `crv` tag
//! - [`KeyPair`] - JWK-shaped public/private keys
//! - [`Operation`] - One entry of the log (create, update, recover, deactivate)
//! - [`OperationLog`] - Committed operations and the rules for appending
//!
//! ## Linking
//!
//! Each operation after the create points at the earlier operation whose keys
//! authorize it. See [`previous_for`].

pub mod curve;
pub mod error;
pub mod jwk;
pub mod jws;
pub mod log;
pub mod operation;
pub mod sidetree;
pub mod validation;

pub use curve::Curve;
pub use error::{CoreError, Result};
pub use jwk::{b64url_decode, b64url_encode, KeyPair, PrivateJwk, PublicJwk};
pub use jws::{DecodedJws, JwsHeader};
pub use log::{previous_for, OperationLog, Proposal};
pub use operation::{Operation, OperationKind};
pub use sidetree::{ContentPatch, CreateOperation, Delta, SuffixData};
pub use validation::validate_log;
