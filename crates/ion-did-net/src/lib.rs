//! # ion-did Net
//!
//! The network-facing collaborators of a DID: resolving a URI to its document
//! and submitting signed requests for anchoring.
//!
//! ## Key Types
//!
//! - [`Resolver`] - Resolution seam; [`HttpResolver`] is the reqwest-backed default
//! - [`AnchorSubmitter`] - Submission seam, with [`AnchorEndpoints`] defaults
//! - [`NetError`] - Status, not-found and transport failures kept distinct
//!
//! No call here retries.

pub mod anchor;
pub mod error;
pub mod resolver;

pub use anchor::{AnchorEndpoints, AnchorSubmitter};
pub use error::{NetError, Result};
pub use resolver::{HttpResolver, HttpResolverConfig, Resolver, DEFAULT_RESOLVER_ENDPOINT};
