//! # ion-did Testkit
//!
//! Testing utilities for ion-did.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known keys, signatures, and DID suffixes computed outside this workspace
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic and misbehaving collaborators for a [`DidState`](ion_did::DidState)
//!
//! ## Golden Vectors
//!
//! ```rust
//! use ion_did_testkit::vectors::{verify_jws_vectors, verify_key_vectors};
//!
//! verify_key_vectors().unwrap();
//! verify_jws_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ion_did_testkit::generators::{log_from_params, LogParams};
//!
//! proptest! {
//!     #[test]
//!     fn log_is_deterministic(params: LogParams) {
//!         prop_assert_eq!(log_from_params(&params), log_from_params(&params));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use ion_did_testkit::DidFixture;
//!
//! let fixture = DidFixture::new()?;
//! let suffix = fixture.did.suffix().await?;
//! assert_eq!(fixture.keys.issued(), 2);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    delayed_did, seeded_secret, CountingEncoder, DelayedKeyProvider, DidFixture, Failure,
    FlakyKeyProvider, RecordingSubmitter, SeededKeyProvider,
};
pub use generators::{log_from_params, LogParams};
pub use vectors::{
    did_vectors, jws_vectors, key_vectors, verify_jws_vectors, verify_key_vectors, DidVector,
    JwsVector, KeyVector,
};
