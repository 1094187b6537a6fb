//! Structural checks for a reconstructed operation log.

use crate::error::{CoreError, Result};
use crate::operation::{Operation, OperationKind};

/// Validate the lifecycle shape of a log supplied from outside.
///
/// This checks:
/// - The log is non-empty and starts with a create
/// - No create appears after index 0
/// - Nothing follows a deactivate
/// - Each operation carries exactly the keypairs its kind introduces
///
/// `previous` links are checked separately when the log is rebuilt, since
/// that needs the committed prefix.
pub fn validate_log(ops: &[Operation]) -> Result<()> {
    let Some(first) = ops.first() else {
        return Err(CoreError::InvalidLog("log is empty".into()));
    };
    if first.kind != OperationKind::Create {
        return Err(CoreError::InvalidLog(format!(
            "log must start with create, found {}",
            first.kind
        )));
    }

    for (index, op) in ops.iter().enumerate() {
        if index > 0 && op.kind == OperationKind::Create {
            return Err(CoreError::InvalidLog(format!("create at index {index}")));
        }

        if !op.has_required_keys() {
            return Err(CoreError::InvalidLog(format!(
                "{} at index {index} has keypairs (recovery: {}, update: {}) that do not match its kind",
                op.kind,
                op.recovery.is_some(),
                op.update.is_some()
            )));
        }

        if op.kind == OperationKind::Deactivate && index + 1 != ops.len() {
            return Err(CoreError::InvalidLog(format!(
                "{} operation(s) follow deactivate at index {index}",
                ops.len() - index - 1
            )));
        }
    }

    Ok(())
}
