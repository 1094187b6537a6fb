//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Value};

use ion_did_core::{Curve, KeyPair, OperationKind, OperationLog};

use crate::fixtures::seeded_secret;

/// Generate a supported curve.
pub fn curve() -> impl Strategy<Value = Curve> {
    prop_oneof![Just(Curve::Secp256k1), Just(Curve::Ed25519)]
}

/// Generate any operation kind.
pub fn operation_kind() -> impl Strategy<Value = OperationKind> {
    prop::sample::select(OperationKind::ALL.to_vec())
}

/// Generate a kind that may follow the create, weighted toward updates.
pub fn follow_up_kind() -> impl Strategy<Value = OperationKind> {
    prop_oneof![
        5 => Just(OperationKind::Update),
        2 => Just(OperationKind::Recover),
        1 => Just(OperationKind::Deactivate),
    ]
}

/// Generate the kinds following a create, cut off after the first
/// deactivate so every sequence is a valid lifecycle.
pub fn kind_sequence(max_len: usize) -> impl Strategy<Value = Vec<OperationKind>> {
    prop::collection::vec(follow_up_kind(), 0..=max_len).prop_map(|mut kinds| {
        if let Some(end) = kinds.iter().position(|k| *k == OperationKind::Deactivate) {
            kinds.truncate(end + 1);
        }
        kinds
    })
}

/// Generate a service entry.
pub fn service() -> impl Strategy<Value = Value> {
    ("[a-z][a-z0-9-]{0,15}", "https://[a-z]{1,12}\\.example").prop_map(|(id, endpoint)| {
        json!({ "id": id, "type": "LinkedDomains", "serviceEndpoint": endpoint })
    })
}

/// Generate update content using the patch members.
pub fn update_content() -> impl Strategy<Value = Value> {
    (
        prop::collection::vec(service(), 0..3),
        prop::collection::vec("[a-z]{1,8}", 0..3),
    )
        .prop_map(|(add, remove)| json!({ "addServices": add, "removeServices": remove }))
}

/// Parameters for generating a log.
#[derive(Debug, Clone)]
pub struct LogParams {
    pub seed: [u8; 32],
    pub curve: Curve,
    pub kinds: Vec<OperationKind>,
}

impl Arbitrary for LogParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<[u8; 32]>(), curve(), kind_sequence(16))
            .prop_map(|(seed, curve, kinds)| LogParams { seed, curve, kinds })
            .boxed()
    }
}

/// Build a committed log: a create followed by `params.kinds`.
///
/// Keys are drawn the way [`SeededKeyProvider`](crate::SeededKeyProvider)
/// draws them: recovery before update, one counter for the whole log.
pub fn log_from_params(params: &LogParams) -> OperationLog {
    let mut counter = 0u64;
    let mut next_key = || {
        let pair = KeyPair::from_secret(params.curve, &seeded_secret(&params.seed, counter))
            .expect("seeded secret is a valid scalar");
        counter += 1;
        pair
    };

    let mut log = OperationLog::new();
    for (index, kind) in std::iter::once(OperationKind::Create)
        .chain(params.kinds.iter().copied())
        .enumerate()
    {
        let recovery = kind.needs_recovery().then(&mut next_key);
        let update = kind.needs_update().then(&mut next_key);
        log.propose(kind)
            .and_then(|proposal| proposal.into_operation(json!({ "index": index }), recovery, update))
            .and_then(|op| log.append(op))
            .expect("generated lifecycle is valid");
    }
    log
}
