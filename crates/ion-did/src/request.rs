//! Request bodies submitted for anchoring.
//!
//! [`RequestBuilder`] turns operation keys and content into a method-specific
//! request. [`IonRequestBuilder`] produces Sidetree/ION JSON:
//!
//! | type | signed data |
//! |---|---|
//! | `create` | none |
//! | `update` | `{updateKey, deltaHash}` |
//! | `recover` | `{recoveryCommitment, recoveryKey, deltaHash}` |
//! | `deactivate` | `{didSuffix, recoveryKey}` |

use async_trait::async_trait;
use ion_did_core::sidetree::{commitment, replace_patch, reveal_value, CreateOperation, Delta};
use ion_did_core::{ContentPatch, JwsHeader, PublicJwk};
use serde_json::{json, Value};

use crate::error::Result;
use crate::signer::Signer;

/// Builds signed request bodies.
#[async_trait]
pub trait RequestBuilder: Send + Sync {
    async fn build_create(
        &self,
        recovery: &PublicJwk,
        update: &PublicJwk,
        content: &Value,
    ) -> Result<Value>;

    /// `update` is the key being revealed, `next_update` the one committed
    /// to. `content` is read as a [`ContentPatch`].
    async fn build_update(
        &self,
        did_suffix: &str,
        signer: &dyn Signer,
        update: &PublicJwk,
        next_update: &PublicJwk,
        content: &Value,
    ) -> Result<Value>;

    async fn build_recover(
        &self,
        did_suffix: &str,
        signer: &dyn Signer,
        recovery: &PublicJwk,
        next_recovery: &PublicJwk,
        next_update: &PublicJwk,
        content: &Value,
    ) -> Result<Value>;

    async fn build_deactivate(
        &self,
        did_suffix: &str,
        recovery: &PublicJwk,
        signer: &dyn Signer,
    ) -> Result<Value>;
}

/// Sidetree v1 request bodies as accepted by ION nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IonRequestBuilder;

#[async_trait]
impl RequestBuilder for IonRequestBuilder {
    async fn build_create(
        &self,
        recovery: &PublicJwk,
        update: &PublicJwk,
        content: &Value,
    ) -> Result<Value> {
        Ok(CreateOperation::new(recovery, update, content)?.to_request()?)
    }

    async fn build_update(
        &self,
        did_suffix: &str,
        signer: &dyn Signer,
        update: &PublicJwk,
        next_update: &PublicJwk,
        content: &Value,
    ) -> Result<Value> {
        let patch = ContentPatch::from_content(content)?;
        let delta = Delta::new(patch.to_patches(), next_update)?;
        let signed_data = signer
            .sign(
                JwsHeader::new(),
                &json!({ "updateKey": update, "deltaHash": delta.hash()? }),
            )
            .await?;

        Ok(json!({
            "type": "update",
            "didSuffix": did_suffix,
            "revealValue": reveal_value(update)?,
            "delta": delta,
            "signedData": signed_data,
        }))
    }

    async fn build_recover(
        &self,
        did_suffix: &str,
        signer: &dyn Signer,
        recovery: &PublicJwk,
        next_recovery: &PublicJwk,
        next_update: &PublicJwk,
        content: &Value,
    ) -> Result<Value> {
        let delta = Delta::new(vec![replace_patch(content)], next_update)?;
        let signed_data = signer
            .sign(
                JwsHeader::new(),
                &json!({
                    "recoveryCommitment": commitment(next_recovery)?,
                    "recoveryKey": recovery,
                    "deltaHash": delta.hash()?,
                }),
            )
            .await?;

        Ok(json!({
            "type": "recover",
            "didSuffix": did_suffix,
            "revealValue": reveal_value(recovery)?,
            "delta": delta,
            "signedData": signed_data,
        }))
    }

    async fn build_deactivate(
        &self,
        did_suffix: &str,
        recovery: &PublicJwk,
        signer: &dyn Signer,
    ) -> Result<Value> {
        let signed_data = signer
            .sign(
                JwsHeader::new(),
                &json!({ "didSuffix": did_suffix, "recoveryKey": recovery }),
            )
            .await?;

        Ok(json!({
            "type": "deactivate",
            "didSuffix": did_suffix,
            "revealValue": reveal_value(recovery)?,
            "signedData": signed_data,
        }))
    }
}
