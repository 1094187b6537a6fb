//! Long-form URI encoding.

use ion_did_core::sidetree::{long_form_did, CreateOperation};
use ion_did_core::PublicJwk;
use serde_json::Value;

use crate::config::DidConfig;
use crate::error::Result;

/// Derives the long-form URI from the create operation's inputs.
///
/// Must be a pure function of its arguments.
pub trait LongFormEncoder: Send + Sync {
    fn long_form(&self, recovery: &PublicJwk, update: &PublicJwk, content: &Value) -> Result<String>;
}

/// Sidetree long-form DIDs, `did:<method>[:<network>]:<suffix>:<initial state>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IonEncoder {
    method: String,
    network: Option<String>,
}

impl IonEncoder {
    pub fn new(method: impl Into<String>, network: Option<String>) -> Self {
        Self {
            method: method.into(),
            network,
        }
    }

    pub fn from_config(config: &DidConfig) -> Self {
        Self::new(config.method.clone(), config.network.clone())
    }
}

impl Default for IonEncoder {
    fn default() -> Self {
        Self::from_config(&DidConfig::default())
    }
}

impl LongFormEncoder for IonEncoder {
    fn long_form(&self, recovery: &PublicJwk, update: &PublicJwk, content: &Value) -> Result<String> {
        let create = CreateOperation::new(recovery, update, content)?;
        Ok(long_form_did(&self.method, self.network.as_deref(), &create)?)
    }
}
