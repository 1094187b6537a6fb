//! DID state: an operation log behind a FIFO queue, plus the URIs and
//! request bodies derived from it.
//!
//! Every call that mutates the log, or needs it settled, goes through the
//! [`OperationQueue`]. Calls issued concurrently therefore commit in issue
//! order, and a read queued after a write sees that write.

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use ion_did_core::{CoreError, KeyPair, Operation, OperationKind, OperationLog};

use crate::config::DidConfig;
use crate::encoder::{IonEncoder, LongFormEncoder};
use crate::error::{DidError, Result};
use crate::keys::{KeyPairProvider, RandomKeyProvider};
use crate::queue::OperationQueue;
use crate::request::{IonRequestBuilder, RequestBuilder};
use crate::signer::{LocalSigner, Signer};

/// Which URI form to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UriForm {
    /// Short form plus the encoded initial state; resolvable before anchoring.
    #[default]
    Long,
    /// `did:<method>[:<network>]:<suffix>`.
    Short,
}

/// The operation a request is generated for.
#[derive(Debug, Clone)]
pub enum RequestTarget {
    /// Index into the settled log.
    Index(usize),
    /// An operation held by the caller, committed or not.
    Operation(Arc<Operation>),
}

impl From<usize> for RequestTarget {
    fn from(index: usize) -> Self {
        RequestTarget::Index(index)
    }
}

impl From<Arc<Operation>> for RequestTarget {
    fn from(op: Arc<Operation>) -> Self {
        RequestTarget::Operation(op)
    }
}

impl From<Operation> for RequestTarget {
    fn from(op: Operation) -> Self {
        RequestTarget::Operation(Arc::new(op))
    }
}

/// Options for [`DidState::generate_request`].
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Sign with this instead of the authorizing private key in the log.
    pub signer: Option<Arc<dyn Signer>>,
}

impl RequestOptions {
    pub fn with_signer(signer: Arc<dyn Signer>) -> Self {
        Self {
            signer: Some(signer),
        }
    }
}

/// A settled view of the DID.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidSnapshot {
    pub short_form: String,
    pub long_form: String,
    pub ops: Vec<Arc<Operation>>,
}

struct Inner {
    log: RwLock<OperationLog>,
    long_form: OnceCell<String>,
    keys: Arc<dyn KeyPairProvider>,
    encoder: Arc<dyn LongFormEncoder>,
    requests: Arc<dyn RequestBuilder>,
    config: DidConfig,
}

/// A DID and its operation log.
///
/// Cheap to clone; clones share the log, the URI cache, and the queue.
#[derive(Clone)]
pub struct DidState {
    inner: Arc<Inner>,
    queue: OperationQueue,
}

impl std::fmt::Debug for DidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DidState")
            .field("config", &self.inner.config)
            .field("committed", &self.inner.log.read().len())
            .field("long_form", &self.inner.long_form.get())
            .finish()
    }
}

/// Builder for [`DidState`].
pub struct DidStateBuilder {
    config: DidConfig,
    operations: Vec<Operation>,
    content: Value,
    keys: Option<Arc<dyn KeyPairProvider>>,
    encoder: Option<Arc<dyn LongFormEncoder>>,
    requests: Option<Arc<dyn RequestBuilder>>,
}

impl Default for DidStateBuilder {
    fn default() -> Self {
        Self {
            config: DidConfig::default(),
            operations: Vec::new(),
            content: json!({}),
            keys: None,
            encoder: None,
            requests: None,
        }
    }
}

impl DidStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: DidConfig) -> Self {
        self.config = config;
        self
    }

    /// Reconstruct from a persisted log instead of creating a new DID.
    pub fn operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations = operations;
        self
    }

    /// Document content for the synthesized create. `null` means `{}`.
    pub fn content(mut self, content: Value) -> Self {
        self.content = if content.is_null() { json!({}) } else { content };
        self
    }

    pub fn key_provider(mut self, keys: Arc<dyn KeyPairProvider>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn encoder(mut self, encoder: Arc<dyn LongFormEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn request_builder(mut self, requests: Arc<dyn RequestBuilder>) -> Self {
        self.requests = Some(requests);
        self
    }

    /// Start the queue and, for a fresh DID, enqueue the create.
    ///
    /// A supplied log is validated first. The create is enqueued but not
    /// awaited; anything queued afterwards sees it committed. If generating
    /// it fails, the failure is logged and later operations report
    /// [`CoreError::MissingCreate`].
    pub fn build(self) -> Result<DidState> {
        let fresh = self.operations.is_empty();
        let log = if fresh {
            OperationLog::new()
        } else {
            OperationLog::from_operations(self.operations)?
        };

        let encoder = self
            .encoder
            .unwrap_or_else(|| Arc::new(IonEncoder::from_config(&self.config)));
        let state = DidState {
            inner: Arc::new(Inner {
                log: RwLock::new(log),
                long_form: OnceCell::new(),
                keys: self.keys.unwrap_or_else(|| Arc::new(RandomKeyProvider)),
                encoder,
                requests: self.requests.unwrap_or_else(|| Arc::new(IonRequestBuilder)),
                config: self.config,
            }),
            queue: OperationQueue::spawn()?,
        };

        if fresh {
            let create = run_proposal(
                Arc::clone(&state.inner),
                OperationKind::Create,
                self.content,
                true,
            );
            // Nobody waits on this receiver; the outcome is logged instead.
            let _pending = state.queue.dispatch(async move {
                let result = create.await;
                if let Err(e) = &result {
                    warn!(error = %e, "failed to generate create operation");
                }
                result
            })?;
        }

        Ok(state)
    }
}

impl DidState {
    pub fn builder() -> DidStateBuilder {
        DidStateBuilder::new()
    }

    /// A new DID with default configuration and the given document content.
    pub fn new(content: Value) -> Result<Self> {
        Self::builder().content(content).build()
    }

    /// Reconstruct a DID from a persisted log.
    pub fn from_operations(operations: Vec<Operation>) -> Result<Self> {
        if operations.is_empty() {
            return Err(CoreError::InvalidLog("log is empty".into()).into());
        }
        Self::builder().operations(operations).build()
    }

    pub fn config(&self) -> &DidConfig {
        &self.inner.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Enqueue construction of a new operation.
    ///
    /// The task is placed on the queue when this is called, not when the
    /// returned future is first polled. When `commit` is false the operation
    /// is built against the current log but not appended, and later
    /// operations do not link to it.
    pub fn propose_operation(
        &self,
        kind: OperationKind,
        content: Value,
        commit: bool,
    ) -> impl Future<Output = Result<Arc<Operation>>> + Send + 'static {
        self.queue
            .enqueue(run_proposal(Arc::clone(&self.inner), kind, content, commit))
    }

    /// Build and commit a new operation.
    pub fn generate_operation(
        &self,
        kind: OperationKind,
        content: Value,
    ) -> impl Future<Output = Result<Arc<Operation>>> + Send + 'static {
        self.propose_operation(kind, content, true)
    }

    /// The settled log, after every operation enqueued before this call.
    pub async fn operations(&self) -> Result<Vec<Arc<Operation>>> {
        let inner = Arc::clone(&self.inner);
        self.queue
            .enqueue(async move { Ok(inner.log.read().operations().to_vec()) })
            .await
    }

    /// The operation at `index` in the settled log.
    pub async fn operation(&self, index: usize) -> Result<Arc<Operation>> {
        let inner = Arc::clone(&self.inner);
        self.queue
            .enqueue(async move {
                inner
                    .log
                    .read()
                    .get(index)
                    .cloned()
                    .ok_or(DidError::OperationNotFound(index))
            })
            .await
    }

    /// The operation at `index` if it is already committed.
    ///
    /// Does not wait for pending operations.
    pub fn committed_operation(&self, index: usize) -> Option<Arc<Operation>> {
        self.inner.log.read().get(index).cloned()
    }

    /// Number of committed operations, without waiting for pending ones.
    pub fn committed_len(&self) -> usize {
        self.inner.log.read().len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // URIs
    // ─────────────────────────────────────────────────────────────────────────

    /// The DID URI.
    ///
    /// The long form is computed from the settled create once per instance;
    /// concurrent first callers share that computation.
    pub async fn uri(&self, form: UriForm) -> Result<String> {
        let long_form = self.long_form().await?;
        Ok(match form {
            UriForm::Long => long_form.to_string(),
            UriForm::Short => short_form_of(long_form).to_string(),
        })
    }

    /// The unique suffix, the last segment of the short form.
    pub async fn suffix(&self) -> Result<String> {
        let long_form = self.long_form().await?;
        let short = short_form_of(long_form);
        Ok(short.rsplit(':').next().unwrap_or(short).to_string())
    }

    /// Both URI forms and the settled log.
    pub async fn state(&self) -> Result<DidSnapshot> {
        let long_form = self.uri(UriForm::Long).await?;
        let ops = self.operations().await?;
        Ok(DidSnapshot {
            short_form: short_form_of(&long_form).to_string(),
            long_form,
            ops,
        })
    }

    async fn long_form(&self) -> Result<&str> {
        let long_form = self
            .inner
            .long_form
            .get_or_try_init(|| {
                let inner = Arc::clone(&self.inner);
                let settled_create = self.queue.enqueue(async move {
                    inner
                        .log
                        .read()
                        .first()
                        .cloned()
                        .ok_or(DidError::Core(CoreError::MissingCreate))
                });
                let encoder = Arc::clone(&self.inner.encoder);
                async move {
                    let create = settled_create.await?;
                    let (recovery, update) = create_keys(&create)?;
                    let long_form =
                        encoder.long_form(&recovery.public_jwk, &update.public_jwk, &create.content)?;
                    debug!(uri = %short_form_of(&long_form), "computed long-form URI");
                    Ok::<_, DidError>(long_form)
                }
            })
            .await?;
        Ok(long_form.as_str())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Build the signed request body for an operation.
    ///
    /// The authorizing key comes from the operation's `previous`: its update
    /// key for an update, its recovery key for a recover or deactivate.
    /// `options.signer` replaces the local private key when set.
    pub async fn generate_request(
        &self,
        target: impl Into<RequestTarget>,
        options: RequestOptions,
    ) -> Result<Value> {
        let op = match target.into() {
            RequestTarget::Index(index) => self.operation(index).await?,
            RequestTarget::Operation(op) => op,
        };
        let requests = &self.inner.requests;

        match op.kind {
            OperationKind::Create => {
                let (recovery, update) = create_keys(&op)?;
                requests
                    .build_create(&recovery.public_jwk, &update.public_jwk, &op.content)
                    .await
            }
            OperationKind::Update => {
                let authorizing = required(op.previous_update(), "previous update key")?;
                let next_update = required(op.update.as_ref(), "update key")?;
                let signer = signer_for(&options, authorizing);
                let suffix = self.suffix().await?;
                requests
                    .build_update(
                        &suffix,
                        signer.as_ref(),
                        &authorizing.public_jwk,
                        &next_update.public_jwk,
                        &op.content,
                    )
                    .await
            }
            OperationKind::Recover => {
                let authorizing = required(op.previous_recovery(), "previous recovery key")?;
                let next_recovery = required(op.recovery.as_ref(), "recovery key")?;
                let next_update = required(op.update.as_ref(), "update key")?;
                let signer = signer_for(&options, authorizing);
                let suffix = self.suffix().await?;
                requests
                    .build_recover(
                        &suffix,
                        signer.as_ref(),
                        &authorizing.public_jwk,
                        &next_recovery.public_jwk,
                        &next_update.public_jwk,
                        &op.content,
                    )
                    .await
            }
            OperationKind::Deactivate => {
                let authorizing = required(op.previous_recovery(), "previous recovery key")?;
                let signer = signer_for(&options, authorizing);
                let suffix = self.suffix().await?;
                requests
                    .build_deactivate(&suffix, &authorizing.public_jwk, signer.as_ref())
                    .await
            }
        }
    }
}

/// Body of every operation-producing task. Runs inside the queue.
async fn run_proposal(
    inner: Arc<Inner>,
    kind: OperationKind,
    content: Value,
    commit: bool,
) -> Result<Arc<Operation>> {
    let proposal = {
        let log = inner.log.read();
        log.propose(kind)?
    };

    let curve = inner.config.curve;
    let recovery = if kind.needs_recovery() {
        Some(inner.keys.generate(curve).await?)
    } else {
        None
    };
    let update = if kind.needs_update() {
        Some(inner.keys.generate(curve).await?)
    } else {
        None
    };

    let op = proposal.into_operation(content, recovery, update)?;
    if !commit {
        return Ok(Arc::new(op));
    }

    let (op, index) = {
        let mut log = inner.log.write();
        let op = log.append(op)?;
        (op, log.len() - 1)
    };
    debug!(%kind, index, "operation committed");
    Ok(op)
}

fn short_form_of(long_form: &str) -> &str {
    long_form
        .rsplit_once(':')
        .map(|(short, _)| short)
        .unwrap_or(long_form)
}

fn required<'a>(key: Option<&'a KeyPair>, what: &str) -> Result<&'a KeyPair> {
    key.ok_or_else(|| DidError::Core(CoreError::InvalidOperation(format!("missing {what}"))))
}

fn create_keys(op: &Operation) -> Result<(&KeyPair, &KeyPair)> {
    Ok((
        required(op.recovery.as_ref(), "recovery key")?,
        required(op.update.as_ref(), "update key")?,
    ))
}

fn signer_for(options: &RequestOptions, authorizing: &KeyPair) -> Arc<dyn Signer> {
    match &options.signer {
        Some(signer) => Arc::clone(signer),
        None => Arc::new(LocalSigner::from_keypair(authorizing)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form_of() {
        assert_eq!(short_form_of("did:ion:EiA:eyJ"), "did:ion:EiA");
        assert_eq!(short_form_of("did:ion:test:EiA:eyJ"), "did:ion:test:EiA");
    }

    #[tokio::test]
    async fn test_fresh_did_has_create() {
        let did = DidState::new(Value::Null).unwrap();
        let ops = did.operations().await.unwrap();

        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Create);
        assert_eq!(ops[0].content, json!({}));
        assert!(ops[0].recovery.is_some() && ops[0].update.is_some());
        assert_eq!(ops[0].update.as_ref().unwrap().public_jwk.crv, "secp256k1");
    }

    #[tokio::test]
    async fn test_uri_forms_agree() {
        let did = DidState::new(json!({})).unwrap();
        let long = did.uri(UriForm::Long).await.unwrap();
        let short = did.uri(UriForm::Short).await.unwrap();
        let suffix = did.suffix().await.unwrap();

        assert!(long.starts_with(&format!("{short}:")));
        assert_eq!(short, format!("did:ion:{suffix}"));
        assert!(suffix.starts_with("Ei"));
    }

    #[tokio::test]
    async fn test_operation_index_out_of_range() {
        let did = DidState::new(json!({})).unwrap();
        assert!(matches!(
            did.operation(3).await,
            Err(DidError::OperationNotFound(3))
        ));
    }

    #[tokio::test]
    async fn test_from_operations_rejects_empty() {
        let err = DidState::from_operations(Vec::new()).unwrap_err();
        assert!(matches!(err, DidError::Core(CoreError::InvalidLog(_))));
    }

    #[test]
    fn test_build_requires_runtime() {
        assert!(matches!(DidState::new(json!({})), Err(DidError::NoRuntime)));
    }
}
