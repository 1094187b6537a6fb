//! The operation log: an ordered, append-only sequence of operations.
//!
//! ## Rules
//!
//! - Index 0 is the create; no other create is accepted.
//! - A deactivate is terminal; nothing is appended after it.
//! - Every later operation links to an earlier one through `previous`,
//!   chosen by [`previous_for`] over the committed entries only.
//!
//! Building an operation is split in two so key generation can happen in
//! between: [`OperationLog::propose`] checks the rules and fixes the
//! `previous` link, then [`Proposal::into_operation`] attaches content and
//! keys. Nothing touches the log until [`OperationLog::append`].

use serde_json::Value;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::jwk::KeyPair;
use crate::operation::{Operation, OperationKind};
use crate::validation::validate_log;

/// Pick the `previous` link for a new operation of `kind`.
///
/// Returns the last entry of `log` that [satisfies](OperationKind::satisfies)
/// `kind`, falling back to the first entry when nothing matches. Returns
/// `None` for a create or an empty log.
pub fn previous_for(kind: OperationKind, log: &[Arc<Operation>]) -> Option<Arc<Operation>> {
    if kind == OperationKind::Create {
        return None;
    }
    let first = log.first()?;
    let found = log
        .iter()
        .rev()
        .find(|op| op.kind.satisfies(kind))
        .unwrap_or(first);
    Some(Arc::clone(found))
}

/// A checked, not-yet-built operation.
#[derive(Debug, Clone)]
pub struct Proposal {
    kind: OperationKind,
    previous: Option<Arc<Operation>>,
}

impl Proposal {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn previous(&self) -> Option<&Arc<Operation>> {
        self.previous.as_ref()
    }

    /// Attach content and keys.
    ///
    /// Fails if the keypairs supplied do not match what the kind introduces.
    pub fn into_operation(
        self,
        content: Value,
        recovery: Option<KeyPair>,
        update: Option<KeyPair>,
    ) -> Result<Operation> {
        let op = Operation {
            kind: self.kind,
            content,
            previous: self.previous,
            recovery,
            update,
        };
        if !op.has_required_keys() {
            return Err(CoreError::InvalidOperation(format!(
                "{} needs recovery={} update={}",
                op.kind,
                op.kind.needs_recovery(),
                op.kind.needs_update()
            )));
        }
        Ok(op)
    }
}

/// Committed operations, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationLog {
    ops: Vec<Arc<Operation>>,
}

impl OperationLog {
    /// An empty log, waiting for its create.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted operations.
    ///
    /// Runs [`validate_log`], then checks that each `previous` equals what
    /// [`previous_for`] picks over the entries before it. The rebuilt log
    /// shares `previous` links with its own entries.
    pub fn from_operations(ops: Vec<Operation>) -> Result<Self> {
        validate_log(&ops)?;

        let mut log = Self::new();
        for (index, mut op) in ops.into_iter().enumerate() {
            let expected = previous_for(op.kind, &log.ops);
            if !same_link(op.previous.as_ref(), expected.as_ref()) {
                return Err(CoreError::InvalidLog(format!(
                    "{} at index {index} does not link to the expected previous operation",
                    op.kind
                )));
            }
            op.previous = expected;
            log.ops.push(Arc::new(op));
        }
        Ok(log)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Operation>> {
        self.ops.get(index)
    }

    pub fn first(&self) -> Option<&Arc<Operation>> {
        self.ops.first()
    }

    pub fn last(&self) -> Option<&Arc<Operation>> {
        self.ops.last()
    }

    /// All committed operations, oldest first.
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.ops
    }

    /// Whether the last committed operation is a deactivate.
    pub fn is_deactivated(&self) -> bool {
        self.last()
            .is_some_and(|op| op.kind == OperationKind::Deactivate)
    }

    /// Check that an operation of `kind` may follow the committed entries,
    /// and fix its `previous` link.
    pub fn propose(&self, kind: OperationKind) -> Result<Proposal> {
        if self.is_deactivated() {
            return Err(CoreError::TerminalState);
        }
        match (kind, self.is_empty()) {
            (OperationKind::Create, false) => {
                return Err(CoreError::InvalidOperation(
                    "create must be the first operation".into(),
                ))
            }
            (OperationKind::Create, true) => {}
            (_, true) => return Err(CoreError::MissingCreate),
            (_, false) => {}
        }
        Ok(Proposal {
            kind,
            previous: previous_for(kind, &self.ops),
        })
    }

    /// Commit a built operation.
    ///
    /// Re-checks the rules against the current entries, so an operation built
    /// from a proposal that has since gone stale is refused.
    pub fn append(&mut self, op: Operation) -> Result<Arc<Operation>> {
        let proposal = self.propose(op.kind)?;
        if !same_link(op.previous.as_ref(), proposal.previous()) {
            return Err(CoreError::InvalidOperation(format!(
                "{} links to a stale previous operation",
                op.kind
            )));
        }
        if !op.has_required_keys() {
            return Err(CoreError::InvalidOperation(format!(
                "{} is missing key material",
                op.kind
            )));
        }

        let op = Arc::new(op);
        self.ops.push(Arc::clone(&op));
        Ok(op)
    }
}

fn same_link(given: Option<&Arc<Operation>>, expected: Option<&Arc<Operation>>) -> bool {
    match (given, expected) {
        (None, None) => true,
        (Some(given), Some(expected)) => Arc::ptr_eq(given, expected) || given == expected,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use proptest::prelude::*;
    use serde_json::json;

    fn pair(seed: u8) -> KeyPair {
        KeyPair::from_secret(Curve::Ed25519, &[seed; 32]).unwrap()
    }

    fn commit(log: &mut OperationLog, kind: OperationKind) -> Arc<Operation> {
        let seed = log.len() as u8 + 1;
        let op = log
            .propose(kind)
            .unwrap()
            .into_operation(
                json!({ "seq": seed }),
                kind.needs_recovery().then(|| pair(seed)),
                kind.needs_update().then(|| pair(seed.wrapping_add(100))),
            )
            .unwrap();
        log.append(op).unwrap()
    }

    fn log_of(kinds: &[OperationKind]) -> OperationLog {
        let mut log = OperationLog::new();
        commit(&mut log, OperationKind::Create);
        for kind in kinds {
            commit(&mut log, *kind);
        }
        log
    }

    /// Forward scan seeded with the first entry; the last match wins.
    fn reference_previous(kind: OperationKind, log: &[Arc<Operation>]) -> Option<usize> {
        if kind == OperationKind::Create || log.is_empty() {
            return None;
        }
        let mut chosen = 0;
        for (index, op) in log.iter().enumerate() {
            let matches = op.kind == kind
                || (op.kind == OperationKind::Recover
                    && matches!(kind, OperationKind::Update | OperationKind::Deactivate));
            if matches {
                chosen = index;
            }
        }
        Some(chosen)
    }

    #[test]
    fn test_first_update_links_to_create() {
        let log = log_of(&[OperationKind::Update]);
        let update = log.get(1).unwrap();
        assert!(Arc::ptr_eq(update.previous.as_ref().unwrap(), log.get(0).unwrap()));
    }

    #[test]
    fn test_update_links_to_latest_update() {
        use OperationKind::*;
        let log = log_of(&[Update, Update]);
        let last = log.last().unwrap();
        assert!(Arc::ptr_eq(last.previous.as_ref().unwrap(), log.get(1).unwrap()));
    }

    #[test]
    fn test_recover_stands_in_for_update() {
        use OperationKind::*;
        let log = log_of(&[Update, Recover]);
        let proposal = log.propose(Update).unwrap();
        assert!(Arc::ptr_eq(proposal.previous().unwrap(), log.get(2).unwrap()));

        let proposal = log.propose(Deactivate).unwrap();
        assert!(Arc::ptr_eq(proposal.previous().unwrap(), log.get(2).unwrap()));
    }

    #[test]
    fn test_recover_links_to_create_without_prior_recover() {
        use OperationKind::*;
        let log = log_of(&[Update, Update]);
        let proposal = log.propose(Recover).unwrap();
        assert!(Arc::ptr_eq(proposal.previous().unwrap(), log.get(0).unwrap()));
    }

    #[test]
    fn test_deactivate_is_terminal() {
        use OperationKind::*;
        let mut log = log_of(&[Update, Deactivate]);
        assert!(log.is_deactivated());

        for kind in OperationKind::ALL {
            assert!(matches!(log.propose(kind), Err(CoreError::TerminalState)));
        }

        let stray = Operation {
            kind: Update,
            content: Value::Null,
            previous: Some(log.get(1).unwrap().clone()),
            recovery: None,
            update: Some(pair(9)),
        };
        assert!(matches!(log.append(stray), Err(CoreError::TerminalState)));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_non_create_on_empty_log() {
        let log = OperationLog::new();
        assert!(matches!(
            log.propose(OperationKind::Update),
            Err(CoreError::MissingCreate)
        ));
        assert!(previous_for(OperationKind::Update, log.operations()).is_none());
    }

    #[test]
    fn test_second_create_rejected() {
        let log = log_of(&[]);
        assert!(matches!(
            log.propose(OperationKind::Create),
            Err(CoreError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_wrong_keys_rejected() {
        let log = log_of(&[]);
        let err = log
            .propose(OperationKind::Update)
            .unwrap()
            .into_operation(Value::Null, Some(pair(1)), Some(pair(2)))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation(_)));
    }

    #[test]
    fn test_stale_proposal_refused() {
        let mut log = log_of(&[]);
        let stale = log
            .propose(OperationKind::Update)
            .unwrap()
            .into_operation(Value::Null, None, Some(pair(50)))
            .unwrap();
        commit(&mut log, OperationKind::Update);

        assert!(matches!(log.append(stale), Err(CoreError::InvalidOperation(_))));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_uncommitted_proposal_invisible() {
        let log = log_of(&[]);
        let _pending = log
            .propose(OperationKind::Update)
            .unwrap()
            .into_operation(Value::Null, None, Some(pair(60)))
            .unwrap();

        let next = log.propose(OperationKind::Update).unwrap();
        assert!(Arc::ptr_eq(next.previous().unwrap(), log.get(0).unwrap()));
    }

    #[test]
    fn test_rebuild_from_persisted_json() {
        use OperationKind::*;
        let log = log_of(&[Update, Recover, Update]);
        let json = serde_json::to_string(log.operations()).unwrap();

        let ops: Vec<Operation> = serde_json::from_str(&json).unwrap();
        let rebuilt = OperationLog::from_operations(ops).unwrap();

        assert_eq!(rebuilt, log);
        // links point into the rebuilt log, not at private copies
        let last = rebuilt.last().unwrap();
        assert!(Arc::ptr_eq(last.previous.as_ref().unwrap(), rebuilt.get(2).unwrap()));
    }

    #[test]
    fn test_rebuild_rejects_wrong_link() {
        use OperationKind::*;
        let log = log_of(&[Update, Update]);
        let mut ops: Vec<Operation> = log.operations().iter().map(|op| (**op).clone()).collect();
        ops[2].previous = Some(log.get(0).unwrap().clone());

        assert!(matches!(
            OperationLog::from_operations(ops),
            Err(CoreError::InvalidLog(_))
        ));
    }

    fn kind_sequence() -> impl Strategy<Value = Vec<OperationKind>> {
        prop::collection::vec(
            prop_oneof![
                4 => Just(OperationKind::Update),
                2 => Just(OperationKind::Recover),
                1 => Just(OperationKind::Deactivate),
            ],
            0..24,
        )
        .prop_map(|mut kinds| {
            if let Some(end) = kinds.iter().position(|k| *k == OperationKind::Deactivate) {
                kinds.truncate(end + 1);
            }
            kinds
        })
    }

    proptest! {
        #[test]
        fn prop_previous_matches_forward_scan(kinds in kind_sequence()) {
            let log = log_of(&kinds);
            for kind in OperationKind::ALL {
                let got = previous_for(kind, log.operations());
                let want = reference_previous(kind, log.operations());
                match (got, want) {
                    (None, None) => {}
                    (Some(op), Some(index)) => {
                        prop_assert!(Arc::ptr_eq(&op, log.get(index).unwrap()));
                    }
                    (got, want) => prop_assert!(false, "{kind}: got {got:?}, want {want:?}"),
                }
            }
        }

        #[test]
        fn prop_committed_links_follow_rule(kinds in kind_sequence()) {
            let log = log_of(&kinds);
            for index in 1..log.len() {
                let op = log.get(index).unwrap();
                let want = reference_previous(op.kind, &log.operations()[..index]).unwrap();
                prop_assert!(Arc::ptr_eq(op.previous.as_ref().unwrap(), log.get(want).unwrap()));
            }
        }
    }
}
