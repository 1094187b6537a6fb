//! Operations: the entries of a DID's append-only log.
//!
//! An operation records which lifecycle step it is, the document content it
//! carries, a back-reference to the earlier operation whose keys authorize it,
//! and the fresh keypairs it introduces.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::jwk::KeyPair;

/// Lifecycle step an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Recover,
    Deactivate,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Create,
        OperationKind::Update,
        OperationKind::Recover,
        OperationKind::Deactivate,
    ];

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Recover => "recover",
            OperationKind::Deactivate => "deactivate",
        }
    }

    /// Whether operations of this kind introduce a recovery keypair.
    pub fn needs_recovery(self) -> bool {
        matches!(self, OperationKind::Create | OperationKind::Recover)
    }

    /// Whether operations of this kind introduce an update keypair.
    pub fn needs_update(self) -> bool {
        !matches!(self, OperationKind::Deactivate)
    }

    /// Whether an earlier operation of kind `self` can be the `previous` link
    /// of a new operation of kind `wanted`.
    ///
    /// A recover rotates both key generations, so it stands in for the last
    /// update when looking up an update or deactivate predecessor.
    pub fn satisfies(self, wanted: OperationKind) -> bool {
        self == wanted
            || (self == OperationKind::Recover
                && matches!(wanted, OperationKind::Update | OperationKind::Deactivate))
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the operation log.
///
/// Immutable once built. `previous` is shared with the log entry it points
/// at rather than copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operation")]
    pub kind: OperationKind,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Arc<Operation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<KeyPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<KeyPair>,
}

impl Operation {
    /// The previous operation's update keypair, which authorizes an update.
    pub fn previous_update(&self) -> Option<&KeyPair> {
        self.previous.as_deref()?.update.as_ref()
    }

    /// The previous operation's recovery keypair, which authorizes a recover
    /// or deactivate.
    pub fn previous_recovery(&self) -> Option<&KeyPair> {
        self.previous.as_deref()?.recovery.as_ref()
    }

    /// Whether the keypairs present match what this kind requires.
    pub fn has_required_keys(&self) -> bool {
        self.recovery.is_some() == self.kind.needs_recovery()
            && self.update.is_some() == self.kind.needs_update()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use serde_json::json;

    fn pair(seed: u8) -> KeyPair {
        KeyPair::from_secret(Curve::Ed25519, &[seed; 32]).unwrap()
    }

    #[test]
    fn test_key_requirements_per_kind() {
        use OperationKind::*;
        assert!(Create.needs_recovery() && Create.needs_update());
        assert!(!Update.needs_recovery() && Update.needs_update());
        assert!(Recover.needs_recovery() && Recover.needs_update());
        assert!(!Deactivate.needs_recovery() && !Deactivate.needs_update());
    }

    #[test]
    fn test_recover_satisfies_update_and_deactivate() {
        use OperationKind::*;
        assert!(Recover.satisfies(Update));
        assert!(Recover.satisfies(Deactivate));
        assert!(Recover.satisfies(Recover));
        assert!(!Update.satisfies(Recover));
        assert!(!Update.satisfies(Deactivate));
        assert!(!Create.satisfies(Update));
    }

    #[test]
    fn test_json_uses_operation_field() {
        let create = Arc::new(Operation {
            kind: OperationKind::Create,
            content: json!({}),
            previous: None,
            recovery: Some(pair(1)),
            update: Some(pair(2)),
        });
        let update = Operation {
            kind: OperationKind::Update,
            content: json!({ "addServices": [] }),
            previous: Some(create.clone()),
            recovery: None,
            update: Some(pair(3)),
        };

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["operation"], "update");
        assert_eq!(value["previous"]["operation"], "create");
        assert!(value.get("recovery").is_none());
        assert!(value["previous"].get("previous").is_none());

        let back: Operation = serde_json::from_value(value).unwrap();
        assert_eq!(back, update);
        assert_eq!(back.previous_update(), create.update.as_ref());
        assert!(back.has_required_keys());
    }

    #[test]
    fn test_missing_content_defaults_to_null() {
        let op: Operation = serde_json::from_value(json!({ "operation": "deactivate" })).unwrap();
        assert_eq!(op.content, Value::Null);
        assert!(op.previous_recovery().is_none());
        assert!(op.has_required_keys());
    }
}
