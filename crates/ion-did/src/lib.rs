//! # ion-did
//!
//! Lifecycle management for a `did:ion` identifier.
//!
//! ## Overview
//!
//! A [`DidState`] owns an append-only log of operations:
//!
//! - **Create**: introduces the first recovery and update keys
//! - **Update**: reveals the current update key, commits to the next
//! - **Recover**: reveals the recovery key, rotates both key generations
//! - **Deactivate**: reveals the recovery key; nothing may follow it
//!
//! Operations are generated through a FIFO queue, so calls issued
//! concurrently commit in the order they were issued even though key
//! generation is asynchronous.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ion_did::{DidState, OperationKind, RequestOptions, UriForm};
//! use serde_json::json;
//!
//! async fn example() -> ion_did::Result<()> {
//!     // A fresh DID; the create is generated in the background
//!     let did = DidState::new(json!({}))?;
//!
//!     let long_form = did.uri(UriForm::Long).await?;
//!     println!("{long_form}");
//!
//!     // Rotate the update key and add a service
//!     let update = did
//!         .generate_operation(
//!             OperationKind::Update,
//!             json!({ "addServices": [{ "id": "hub", "type": "LinkedDomains", "serviceEndpoint": "https://example.com" }] }),
//!         )
//!         .await?;
//!
//!     let request = did.generate_request(update, RequestOptions::default()).await?;
//!     println!("{request}");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ion_did::core` - Keys, JWS, the operation log, Sidetree encoding
//! - `ion_did::net` - Resolution and anchoring

pub mod config;
pub mod did;
pub mod encoder;
pub mod error;
pub mod keys;
pub mod persist;
pub mod queue;
pub mod request;
pub mod signer;

// Re-export component crates
pub use ion_did_core as core;
pub use ion_did_net as net;

pub use config::DidConfig;
pub use did::{DidSnapshot, DidState, DidStateBuilder, RequestOptions, RequestTarget, UriForm};
pub use encoder::{IonEncoder, LongFormEncoder};
pub use error::{DidError, Result};
pub use keys::{KeyPairProvider, RandomKeyProvider};
pub use persist::operations_from_json;
pub use queue::OperationQueue;
pub use request::{IonRequestBuilder, RequestBuilder};
pub use signer::{LocalSigner, Signer};

// Re-export commonly used core types
pub use ion_did_core::{Curve, KeyPair, Operation, OperationKind, PrivateJwk, PublicJwk};
