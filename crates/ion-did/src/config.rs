//! Configuration for a [`DidState`](crate::DidState).

use ion_did_core::Curve;

/// Configuration for a DID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidConfig {
    /// Curve for every keypair the DID generates.
    pub curve: Curve,
    /// DID method name, the second segment of the URI.
    pub method: String,
    /// Optional network segment, e.g. `test`.
    pub network: Option<String>,
}

impl Default for DidConfig {
    fn default() -> Self {
        Self {
            curve: Curve::Secp256k1,
            method: "ion".to_string(),
            network: None,
        }
    }
}

impl DidConfig {
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }
}
