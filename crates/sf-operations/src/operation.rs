//! Lifecycle, result and failure of a single operation.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use busbar_sf_mapping::MappingContext;
use tokio::sync::Notify;
use tracing::warn;
use uuid::Uuid;

use crate::error::{IllegalStateError, Result};
use crate::transport::{RemoteFailure, TransportError, WireResponse};
use crate::visitor::OperationVisitor;

/// What an operation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Get,
    Update,
    Patch,
    Delete,
    Query,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Create => "create",
            OperationKind::Get => "get",
            OperationKind::Update => "update",
            OperationKind::Patch => "patch",
            OperationKind::Delete => "delete",
            OperationKind::Query => "query",
        };
        f.write_str(name)
    }
}

/// Where an operation is in its lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Created,
    Started,
    Completed,
}

/// Why an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The batch carrying the operation never got a usable answer.
    Transport,
    /// The remote service rejected the operation.
    Remote,
    /// The response could not be turned into the operation's result.
    Deserialization,
}

/// The captured failure of a completed operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind:?} failure: {message}")]
pub struct OperationFailure {
    pub kind: FailureKind,
    /// Remote status, when the service answered.
    pub status: Option<u16>,
    /// Remote error code, e.g. `INVALID_FIELD`.
    pub error_code: Option<String>,
    pub message: String,
    pub fields: Vec<String>,
}

impl OperationFailure {
    pub fn transport(err: &TransportError) -> Self {
        Self {
            kind: FailureKind::Transport,
            status: err.status,
            error_code: None,
            message: err.message.clone(),
            fields: Vec::new(),
        }
    }

    pub fn remote(failure: RemoteFailure) -> Self {
        Self {
            kind: FailureKind::Remote,
            status: Some(failure.status),
            error_code: Some(failure.error_code),
            message: failure.message,
            fields: failure.fields,
        }
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Deserialization,
            status: None,
            error_code: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

enum Progress<R> {
    Created,
    Started,
    Succeeded(R),
    Failed(OperationFailure),
}

impl<R> Progress<R> {
    fn state(&self) -> OperationState {
        match self {
            Progress::Created => OperationState::Created,
            Progress::Started => OperationState::Started,
            Progress::Succeeded(_) | Progress::Failed(_) => OperationState::Completed,
        }
    }
}

struct Inner<R> {
    id: Uuid,
    kind: OperationKind,
    progress: Mutex<Progress<R>>,
    done: Notify,
}

/// Observer handle for one operation.
///
/// Clones share state. Application code can only read; the executor
/// drives the transitions.
pub struct RecordOperation<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for RecordOperation<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Clone + Send + Sync + 'static> RecordOperation<R> {
    pub(crate) fn new(kind: OperationKind) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                kind,
                progress: Mutex::new(Progress::Created),
                done: Notify::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn kind(&self) -> OperationKind {
        self.inner.kind
    }

    pub fn state(&self) -> OperationState {
        self.progress().state()
    }

    pub fn is_completed(&self) -> bool {
        self.state() == OperationState::Completed
    }

    /// True once completed successfully.
    pub fn is_successful(&self) -> bool {
        matches!(*self.progress(), Progress::Succeeded(_))
    }

    /// The result of a successfully completed operation.
    pub fn result(&self) -> std::result::Result<R, IllegalStateError> {
        match &*self.progress() {
            Progress::Succeeded(result) => Ok(result.clone()),
            Progress::Failed(failure) => Err(IllegalStateError::new(format!(
                "{} operation {} failed and has no result: {}",
                self.inner.kind, self.inner.id, failure
            ))),
            _ => Err(self.not_completed()),
        }
    }

    /// The failure of an unsuccessfully completed operation.
    pub fn failure(&self) -> std::result::Result<OperationFailure, IllegalStateError> {
        match &*self.progress() {
            Progress::Failed(failure) => Ok(failure.clone()),
            Progress::Succeeded(_) => Err(IllegalStateError::new(format!(
                "{} operation {} succeeded and has no failure",
                self.inner.kind, self.inner.id
            ))),
            _ => Err(self.not_completed()),
        }
    }

    /// `None` until completed, then the result or the failure.
    pub fn outcome(&self) -> Option<std::result::Result<R, OperationFailure>> {
        match &*self.progress() {
            Progress::Succeeded(result) => Some(Ok(result.clone())),
            Progress::Failed(failure) => Some(Err(failure.clone())),
            _ => None,
        }
    }

    /// Wait for completion.
    pub async fn completed(&self) -> std::result::Result<R, OperationFailure> {
        loop {
            let notified = self.inner.done.notified();
            tokio::pin!(notified);
            // Register before checking, so a completion in between still wakes us.
            notified.as_mut().enable();

            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            notified.await;
        }
    }

    pub(crate) fn start(&self) -> std::result::Result<(), IllegalStateError> {
        let mut progress = self.progress();
        if matches!(*progress, Progress::Created) {
            *progress = Progress::Started;
            return Ok(());
        }
        Err(IllegalStateError::new(format!(
            "{} operation {} cannot start: already {:?}",
            self.inner.kind,
            self.inner.id,
            progress.state()
        )))
    }

    pub(crate) fn succeed(&self, result: R) -> std::result::Result<(), IllegalStateError> {
        self.finish(Progress::Succeeded(result))
    }

    pub(crate) fn fail(&self, failure: OperationFailure) -> std::result::Result<(), IllegalStateError> {
        warn!(
            operation = %self.inner.id,
            kind = %self.inner.kind,
            error = %failure,
            "Operation failed"
        );
        self.finish(Progress::Failed(failure))
    }

    fn finish(&self, outcome: Progress<R>) -> std::result::Result<(), IllegalStateError> {
        {
            let mut progress = self.progress();
            if !matches!(*progress, Progress::Started) {
                return Err(IllegalStateError::new(format!(
                    "{} operation {} cannot complete: {:?}",
                    self.inner.kind,
                    self.inner.id,
                    progress.state()
                )));
            }
            *progress = outcome;
        }
        self.inner.done.notify_waiters();
        Ok(())
    }

    fn not_completed(&self) -> IllegalStateError {
        IllegalStateError::new(format!(
            "{} operation {} has not completed",
            self.inner.kind, self.inner.id
        ))
    }

    fn progress(&self) -> MutexGuard<'_, Progress<R>> {
        self.inner
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Clone + Send + Sync + 'static> fmt::Debug for RecordOperation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordOperation")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("state", &self.state())
            .finish()
    }
}

/// A unit of work the executor can encode and complete.
///
/// Implemented by the operation kinds in this crate; the lifecycle
/// supertrait is sealed.
pub trait Operation: private::Lifecycle + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    fn kind(&self) -> OperationKind;

    fn state(&self) -> OperationState;

    /// Call the visitor method matching this operation's kind.
    fn accept(&self, visitor: &mut dyn OperationVisitor) -> Result<()>;
}

pub(crate) mod private {
    use super::*;

    pub trait Lifecycle {
        /// Created → Started.
        fn begin(&self) -> std::result::Result<(), IllegalStateError>;

        /// Started → Completed from the operation's wire response.
        fn complete(&self, response: WireResponse, context: &MappingContext);

        /// Started → Completed with a failure that never reached the operation.
        fn abort(&self, failure: OperationFailure);
    }
}
