//! Persisted state: the operation log as a JSON array.
//!
//! Each element is an operation record with its `previous` nested in full, so
//! the array can be handed back verbatim to rebuild the DID. A run of `n`
//! consecutive updates nests `n` levels deep, so parsing grows the stack on
//! demand instead of stopping at serde_json's recursion limit.

use ion_did_core::{CoreError, Operation};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::did::{DidState, DidStateBuilder};
use crate::error::Result;

/// Parse a persisted log, however deeply its `previous` records nest.
pub fn operations_from_json(json: &str) -> Result<Vec<Operation>> {
    let mut de = serde_json::Deserializer::from_str(json);
    de.disable_recursion_limit();
    let ops = Vec::<Operation>::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(ops)
}

impl DidState {
    /// The settled log as pretty-printed JSON.
    pub async fn to_json(&self) -> Result<String> {
        let ops = self.operations().await?;
        Ok(serde_json::to_string_pretty(&ops)?)
    }

    /// Write the settled log to `path`.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json().await?;
        tokio::fs::write(path.as_ref(), json).await?;
        debug!(path = %path.as_ref().display(), "saved operation log");
        Ok(())
    }

    /// Rebuild a DID with default configuration from a file written by
    /// [`save`](Self::save).
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        DidStateBuilder::new().load(path).await
    }
}

impl DidStateBuilder {
    /// Use a persisted log in JSON form.
    ///
    /// An empty array is rejected rather than treated as a fresh DID.
    pub fn operations_json(self, json: &str) -> Result<Self> {
        let ops = operations_from_json(json)?;
        if ops.is_empty() {
            return Err(CoreError::InvalidLog("persisted log is empty".into()).into());
        }
        Ok(self.operations(ops))
    }

    /// Read a persisted log from `path` and build.
    pub async fn load(self, path: impl AsRef<Path>) -> Result<DidState> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        let builder = self.operations_json(&json)?;
        debug!(path = %path.as_ref().display(), "loaded operation log");
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DidError;

    #[test]
    fn test_invalid_json_is_serialization_error() {
        assert!(matches!(
            operations_from_json("{not json"),
            Err(DidError::Serialization(_))
        ));
    }

    #[test]
    fn test_trailing_data_rejected() {
        assert!(matches!(
            operations_from_json("[] []"),
            Err(DidError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_array_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        tokio::fs::write(&path, "[]").await.unwrap();

        assert!(matches!(
            DidState::load(&path).await,
            Err(DidError::Core(CoreError::InvalidLog(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DidState::load(dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, DidError::Io(_)));
    }
}
