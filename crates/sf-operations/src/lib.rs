//! # sf-operations
//!
//! Batched record operations over mapped Salesforce records.
//!
//! Operations are grouped in a [`Batch`] and run by an [`Executor`] over any
//! [`Transport`]. Each operation is observed through its [`RecordOperation`]
//! handle, which reports its state and, once completed, either a result or
//! an [`OperationFailure`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Batch                               │
//! │  - create / get / update / patch / delete / query           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Executor                             │
//! │  - Rejects resubmitted, duplicated or unmappable operations │
//! │  - Encodes requests, chunks them, follows query pages       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               Transport (e.g. Composite Batch)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! Every operation moves `Created -> Started -> Completed` exactly once.
//! Only the executor drives those transitions; reading a result before
//! completion is an [`IllegalStateError`].

mod batch;
mod config;
mod encoder;
mod error;
mod executor;
mod kinds;
mod operation;
mod transport;
mod visitor;

#[cfg(test)]
mod testing;

pub use batch::Batch;
pub use config::{ExecutorConfig, ExecutorConfigBuilder, DEFAULT_MAX_BATCH_SIZE};
pub use error::{Error, ErrorKind, IllegalStateError, Result};
pub use executor::Executor;
pub use kinds::{
    CreateOperation, DeleteOperation, GetOperation, PatchOperation, QueryOperation,
    UpdateOperation,
};
pub use operation::{
    FailureKind, Operation, OperationFailure, OperationKind, OperationState, RecordOperation,
};
pub use transport::{RemoteFailure, Transport, TransportError, WireRequest, WireResponse};
pub use visitor::OperationVisitor;
